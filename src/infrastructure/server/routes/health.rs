pub async fn health() -> &'static str {
    "Ok"
}
