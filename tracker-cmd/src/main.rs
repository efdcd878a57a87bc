use mimalloc::MiMalloc;
use tracker_cmd::{cmd, init_tracing};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let _log = init_tracing();
    if let Err(err) = cmd().await {
        tracing::error!("{}", err);
    }
}
