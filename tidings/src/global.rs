//! The process-wide bus.

use std::sync::OnceLock;
use tidings_core::ConfigError;
use tidings_std::{Bus, BusBuilder};

const GLOBAL_NAME: &str = "global";

static GLOBAL: OnceLock<Bus> = OnceLock::new();

/// The process-wide bus.
///
/// Created on first access with the default configuration unless
/// [`init_global`] ran before. Every caller observes the same bus.
pub fn global() -> &'static Bus {
    GLOBAL.get_or_init(|| {
        #[cfg(feature = "tracing")]
        tracing::debug!("creating default global bus");
        Bus::named(GLOBAL_NAME)
    })
}

/// Create the process-wide bus from `builder`.
///
/// Fails with [`ConfigError::GlobalAlreadyInitialized`] if the global bus
/// already exists, whether from an earlier call or from [`global`]. The
/// builder's name is replaced unless it was set explicitly.
pub fn init_global(builder: BusBuilder) -> Result<&'static Bus, ConfigError> {
    if GLOBAL.get().is_some() {
        return Err(ConfigError::GlobalAlreadyInitialized);
    }

    let bus = builder.default_name(GLOBAL_NAME).build()?;
    let mut installed = false;
    let global = GLOBAL.get_or_init(|| {
        installed = true;
        bus
    });
    if !installed {
        return Err(ConfigError::GlobalAlreadyInitialized);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(bus = global.name(), flags = ?global.flags(), "global bus initialized");
    Ok(global)
}
