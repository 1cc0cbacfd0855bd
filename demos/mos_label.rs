use std::error::Error;
use std::io;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    mos_labeler::example_apps::run_labeling_session(
        std::env::args().skip(1),
        stdin.lock(),
        &mut stdout,
    )
}
