use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use mipblit::gpu::full_mip_count;
use mipblit::{
    Blitter, BlitResult, ContextConfig, GpuContext, GraphicsDevice, SubresourceRange,
    TextureFilter, downsample_rgba8, mean_abs_error, save_ppm,
};

/// Settings for the demo run
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub size: (u32, u32),
    pub layers: u32,
    pub output_dir: PathBuf,
    pub benchmark_iterations: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            size: (256, 160),
            layers: 2,
            output_dir: PathBuf::from("mips"),
            benchmark_iterations: 1000,
        }
    }
}

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut context_config = ContextConfig::default();
    if args.iter().any(|a| a == "--fallback") {
        context_config.force_fallback_adapter = true;
    }

    let ctx = match GpuContext::new(&context_config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Failed to create GPU context: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Adapter: {} ({:?}, {:?})\n",
        ctx.adapter_info.name, ctx.adapter_info.backend, ctx.adapter_info.device_type
    );

    let config = DemoConfig::default();
    let result = if args.len() > 1 && args[1] == "--benchmark" {
        run_benchmark(ctx, &config)
    } else {
        run_mip_demo(ctx, &config)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Checkerboard for even layers, diagonal gradient for odd ones
fn layer_pattern(layer: u32, width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    pixels
        .par_chunks_mut((width * 4) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let x = x as u32;
                let value = if layer % 2 == 0 {
                    let on = ((x / 8) + (y / 8)) % 2 == 0;
                    if on { [240, 200, 40, 255] } else { [20, 30, 90, 255] }
                } else {
                    let r = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    [r, g, 255 - r / 2, 255]
                };
                px.copy_from_slice(&value);
            }
        });
    pixels
}

fn create_demo_texture(ctx: &GpuContext, config: &DemoConfig) -> wgpu::Texture {
    let (width, height) = config.size;
    ctx.create_texture(
        "Mip Demo Texture",
        config.size,
        config.layers,
        full_mip_count(width, height),
        TEXTURE_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
    )
}

fn run_mip_demo(ctx: GpuContext, config: &DemoConfig) -> BlitResult<()> {
    let ctx = Arc::new(ctx);
    let (width, height) = config.size;
    let texture = create_demo_texture(&ctx, config);
    let desc = ctx.texture_desc(&texture);

    println!("=== Mip Generation ===");
    println!(
        "{}x{}, {} layer(s), {} mip level(s)\n",
        width, height, desc.array_layer_count, desc.mip_level_count
    );

    for layer in 0..config.layers {
        ctx.upload_rgba8(&texture, layer, &layer_pattern(layer, width, height));
    }

    let mut blitter = Blitter::new(Arc::clone(&ctx))?;
    let mut encoder = ctx.create_encoder("Mip Encoder");
    let start = Instant::now();
    for layer in 0..config.layers {
        blitter.generate_mips(&mut encoder, &texture, layer)?;
    }
    ctx.submit(encoder);
    println!("Recorded and submitted in {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        eprintln!("Cannot create {}: {}", config.output_dir.display(), e);
    }

    for layer in 0..config.layers {
        println!("Layer {}", layer);
        println!("-----------------------");
        let mut previous = ctx.read_rgba8(&texture, 0, layer)?;
        write_level(config, layer, 0, &previous, desc.mip_size(0));

        for mip in 1..desc.mip_level_count {
            let gpu = ctx.read_rgba8(&texture, mip, layer)?;
            // Reference is built from the previous GPU level so errors don't accumulate
            let reference = downsample_rgba8(&previous, desc.mip_size(mip - 1), desc.mip_size(mip));
            let (w, h) = desc.mip_size(mip);
            println!(
                "  mip {:2} {:4}x{:<4} mean abs error: {:.3}",
                mip,
                w,
                h,
                mean_abs_error(&gpu, &reference)
            );
            write_level(config, layer, mip, &gpu, (w, h));
            previous = gpu;
        }
        println!();
    }

    println!(
        "Programs compiled: {}, pipelines created: {}",
        blitter.program_count(),
        blitter.pipeline_count()
    );
    Ok(())
}

fn write_level(config: &DemoConfig, layer: u32, mip: u32, pixels: &[u8], size: (u32, u32)) {
    let path = config
        .output_dir
        .join(format!("layer{}_mip{}.ppm", layer, mip));
    if let Err(e) = save_ppm(pixels, size.0, size.1, &path) {
        log::warn!("Failed to write {}: {}", path.display(), e);
    }
}

fn run_benchmark(ctx: GpuContext, config: &DemoConfig) -> BlitResult<()> {
    println!("=== Blit Benchmark ===\n");

    let ctx = Arc::new(ctx);
    let texture = create_demo_texture(&ctx, config);
    let src = ctx.create_texture_view(&texture, SubresourceRange::single(0, 0))?;
    let dst = ctx.create_texture_view(&texture, SubresourceRange::single(1, 0))?;
    let iterations = config.benchmark_iterations;

    let mut blitter = Blitter::new(Arc::clone(&ctx))?;

    // First blit pays for compilation and pipeline creation
    let mut encoder = ctx.create_encoder("Warmup Encoder");
    let start = Instant::now();
    blitter.blit(&mut encoder, &dst, &src, TextureFilter::Linear)?;
    let cold_ms = start.elapsed().as_secs_f64() * 1000.0;
    ctx.submit(encoder);

    for filter in [TextureFilter::Linear, TextureFilter::Point] {
        let mut encoder = ctx.create_encoder("Benchmark Encoder");
        let start = Instant::now();
        for _ in 0..iterations {
            blitter.blit(&mut encoder, &dst, &src, filter)?;
        }
        let record_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        ctx.submit(encoder);
        ctx.device.poll(wgpu::Maintain::Wait);
        let gpu_ms = start.elapsed().as_secs_f64() * 1000.0;

        println!("{:?} filter, {} blits", filter, iterations);
        println!("-----------------------");
        println!("  Record: {:.4} ms/blit", record_ms / iterations as f64);
        println!("  Submit + wait: {:.3} ms total", gpu_ms);
        println!();
    }

    println!("Cold blit (compile + pipeline): {:.3} ms", cold_ms);
    println!(
        "Cache: {} program(s), {} pipeline(s)",
        blitter.program_count(),
        blitter.pipeline_count()
    );
    Ok(())
}
