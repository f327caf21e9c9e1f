#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dojo_forms_server::run().await
}
