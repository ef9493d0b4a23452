#[actix_web::main]
async fn main() {
    if let Err(e) = nl2sql_lib::run().await {
        tracing::error!(error = %e, "nl2sql failed to start");
        eprintln!("nl2sql: {}", e);
        std::process::exit(1);
    }
}
