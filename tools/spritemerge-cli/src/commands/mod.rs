pub mod combine;
pub mod info;
pub mod init;
pub mod validate;

use anyhow::Context;
use spritemerge_sprite_model::Rect;

/// Split a `PATH` or `PATH@x,y,width,height` argument.
pub fn parse_region_arg(arg: &str) -> anyhow::Result<(String, Option<Rect>)> {
    match arg.rsplit_once('@') {
        Some((path, rect)) if !path.is_empty() => {
            let rect = rect
                .parse::<Rect>()
                .with_context(|| format!("in region argument '{arg}'"))?;
            Ok((path.to_string(), Some(rect)))
        }
        _ => Ok((arg.to_string(), None)),
    }
}
