use anyhow::Result;
use std::ffi::OsString;

use crate::util::config::{RenderMode, ViewerConfig};

/// Command line overrides layered on top of the stored config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerArgs {
    pub backend_url: Option<String>,
    pub simplified: bool,
    pub scale: Option<f32>,
}

impl ViewerArgs {
    pub fn apply(&self, cfg: &mut ViewerConfig) {
        if let Some(url) = &self.backend_url {
            cfg.backend_url = url.trim_end_matches('/').to_string();
        }
        if self.simplified {
            cfg.render_mode = RenderMode::Simplified;
        }
        if let Some(scale) = self.scale {
            cfg.scale = scale;
        }
    }
}

pub fn parse_args() -> Result<ViewerArgs> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ViewerArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = ViewerArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--backend" {
            let Some(url) = args.next() else {
                anyhow::bail!("--backend expects a URL");
            };
            out.backend_url = Some(url.to_string_lossy().into_owned());
        } else if arg == "--simplified" {
            out.simplified = true;
        } else if arg == "--scale" {
            let Some(value) = args.next() else {
                anyhow::bail!("--scale expects a number");
            };
            let value = value.to_string_lossy();
            let scale: f32 = value
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid scale: {value}"))?;
            if !scale.is_finite() || scale <= 0.0 {
                anyhow::bail!("scale must be positive: {value}");
            }
            out.scale = Some(scale);
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    Ok(out)
}
