use std::sync::Once;

/// Variable holding the log filter, e.g. `AAQZ_LOG=aaqz=trace`.
pub const LOG_ENV_VAR: &str = "AAQZ_LOG";

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber when `AAQZ_LOG` or `RUST_LOG` is set.
///
/// Without either variable nothing is installed and tracing stays disabled,
/// so program output is never interleaved with diagnostics by default.
pub fn init_tracing() {
  TRACING_INIT.call_once(|| {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let Ok(filter) =
      EnvFilter::try_from_env(LOG_ENV_VAR).or_else(|_| EnvFilter::try_from_default_env())
    else {
      return;
    };

    tracing_subscriber::registry()
      .with(
        fmt::layer()
          .with_writer(std::io::stderr)
          .with_target(true)
          .with_level(true),
      )
      .with(filter)
      .init();
  });
}
