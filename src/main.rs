#[tokio::main]
async fn main() {
    if let Err(e) = definitions_lib::run().await {
        eprintln!("AVAP Definitions 启动失败: {:#}", e);
        std::process::exit(1);
    }
}
