/// Entry point for the LXC stats collector.
///
/// Reads the configuration from the environment, collects the stats of every active LXC
/// container once, and prints them in line protocol to stdout. Logs go to stderr and are
/// controlled by `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the active containers cannot be listed.
///
/// # Examples
///
/// ```bash
/// LXC_PATH=/var/lib/lxc RUST_LOG=debug cargo run
/// ```
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = lxc_stats::config::Config::from_env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(lxc_stats::run(config));
    // timed out reads may still hold blocking threads
    runtime.shutdown_background();

    println!("{}", output?);
    Ok(())
}
