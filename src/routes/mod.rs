mod earthquakes;
mod export;
mod health_check;
mod subscriptions;

pub use earthquakes::*;
pub use export::*;
pub use health_check::*;
pub use subscriptions::*;

/// Prints an error followed by every cause in its source chain.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
