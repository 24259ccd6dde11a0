use actix_web::{App, HttpServer, web};

/// Spawns an in-process test site on a random port and returns its base URL.
/// Routes are registered through a plain fn pointer so each test file can
/// describe its own site layout. Handlers that need absolute URLs derive
/// them from the request's connection info.
pub async fn spawn_site(configure: fn(&mut web::ServiceConfig)) -> String {
    let http_server = HttpServer::new(move || App::new().configure(configure))
        .bind(("127.0.0.1", 0))
        .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}
