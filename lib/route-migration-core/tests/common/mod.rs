use rstest::fixture;
use tracing::info;

mod mock_erp;
pub use self::mock_erp::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub fn behavior() -> ErpBehavior {
    ErpBehavior::default()
}
