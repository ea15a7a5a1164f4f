pub mod auth;
pub mod config;
pub mod session;
pub mod summary;
pub mod topup;

/// Runtime for commands that talk to the network or wait on the clock.
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
