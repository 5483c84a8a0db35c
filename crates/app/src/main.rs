//! Entry point: load textures from disk onto a headless GPU device.
//! Usage: app [--gpu-backend=..] [--filter=..] [--flip] [--reduced-precision] FILE...

use anyhow::{Context, Result};
use renderer::{CacheConfig, Filter, TextureCache, WgpuDriver};

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_filter_arg() -> Filter {
    // --filter=nearest|linear|mipmap, default linear
    let mut filter = Filter::Linear;
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--filter=") {
            filter = match val.to_ascii_lowercase().as_str() {
                "nearest" => Filter::Nearest,
                "linear" => Filter::Linear,
                "mipmap" | "linear-mipmap-nearest" => Filter::LinearMipmapNearest,
                other => {
                    log::warn!("Unknown filter '{}', using linear.", other);
                    Filter::Linear
                }
            };
        }
    }
    filter
}

fn parse_flag(name: &str) -> bool {
    // --name[=on|off]
    for arg in std::env::args() {
        let Some(rest) = arg.strip_prefix("--").and_then(|a| a.strip_prefix(name)) else {
            continue;
        };
        if rest.is_empty() {
            return true;
        }
        if let Some(val) = rest.strip_prefix('=') {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_paths() -> Vec<String> {
    std::env::args()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let backends = parse_backend_arg();
    let filter = parse_filter_arg();
    let flip = parse_flag("flip");
    let config = CacheConfig {
        reduced_precision: parse_flag("reduced-precision"),
    };
    let paths = parse_paths();
    log::info!(
        "Loading {} texture(s). Backend: {:?}, filter={:?}, flip={}, {:?}",
        paths.len(),
        backends,
        filter,
        flip,
        config
    );

    let driver = WgpuDriver::new_headless(backends).context("Failed to create GPU device")?;
    let mut cache = TextureCache::new(driver).with_config(config);

    for path in &paths {
        let tex = cache
            .texture_from_path(path, flip, filter)
            .with_context(|| format!("Failed to load {path}"))?;
        let (u, v) = tex.uv_extent();
        log::info!(
            "{} -> {} ({}x{}, surface {}x{}, uv {:.3}x{:.3}, alpha={})",
            path,
            tex.handle(),
            tex.width(),
            tex.height(),
            tex.texture_width(),
            tex.texture_height(),
            u,
            v,
            tex.has_alpha()
        );
    }

    log::info!("{} texture(s) resident. Bye!", cache.len());
    Ok(())
}
