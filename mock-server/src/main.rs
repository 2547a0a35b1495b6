use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let username = std::env::var("VERGEIO_USERNAME")
        .unwrap_or_else(|_| mock_server::DEFAULT_USERNAME.to_string());
    let password = std::env::var("VERGEIO_PASSWORD")
        .unwrap_or_else(|_| mock_server::DEFAULT_PASSWORD.to_string());
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} (user {username})");
    mock_server::run_with(listener, mock_server::AppState::new(&username, &password)).await
}
