fn main() {
    #[cfg(feature = "cli")]
    docshrink::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("docshrink: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
