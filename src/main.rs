//! svcenc CLI
//!
//! Command-line front end for the scaler, the SVC repacker and the replay
//! encoder pipeline.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use svcenc_lib::codec::h264::{
    required_output_capacity, LayerBitstream, RepackOutcome, Repacker, PARAM_SET_CAPACITY,
    SVC_PREFIX_LEN,
};
use svcenc_lib::codec::SourcePicture;
use svcenc_lib::hwaccel::replay::split_output_units;
use svcenc_lib::hwaccel::{EncoderConfig, EncoderSession, ReplayEncoderFactory};
use svcenc_lib::swscale::{i420_frame_size, scale_i420, I420Planes, I420PlanesMut};
use svcenc_lib::{init, Config};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "svcenc")]
#[command(about = "svcenc - I420 scaling and SVC layer repacking", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scale a raw I420 file frame by frame
    Scale {
        /// Input .yuv file
        #[arg(short, long)]
        input: PathBuf,

        /// Output .yuv file
        #[arg(short, long)]
        output: PathBuf,

        /// Source size (e.g., 1280x720)
        #[arg(long, value_parser = parse_size)]
        src_size: (u32, u32),

        /// Destination size (e.g., 640x360)
        #[arg(long, value_parser = parse_size)]
        dst_size: (u32, u32),

        /// Treat the input as bottom-up and flip it
        #[arg(long)]
        flip: bool,
    },

    /// Repack an Annex-B H.264 stream into SVC-tagged layers
    Repack {
        /// Input .h264 file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the repacked layers
        #[arg(short, long)]
        output: PathBuf,

        /// Spatial layer id stamped on every layer (0-7)
        #[arg(long, default_value_t = 0)]
        spatial_id: u8,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run raw frames through the encoder pipeline over a captured stream
    Replay {
        /// Captured Annex-B stream the encoder replays
        #[arg(long)]
        stream: PathBuf,

        /// Input .yuv file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the emitted layers
        #[arg(short, long)]
        output: PathBuf,

        /// Input frame size (e.g., 1280x720)
        #[arg(long, value_parser = parse_size)]
        size: (u32, u32),

        /// Encoder configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Encoder size, overriding the configuration
        #[arg(long, value_parser = parse_size)]
        encode_size: Option<(u32, u32)>,

        /// Restart the encoder for a key frame every N frames
        #[arg(long)]
        keyframe_every: Option<u64>,

        /// Print session statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize the library
    let config = Config {
        verbose: cli.verbose,
        debug: cli.debug,
    };

    init(config)?;

    info!("svcenc v{}", svcenc_lib::VERSION);

    // Execute command
    match cli.command {
        Commands::Scale {
            input,
            output,
            src_size,
            dst_size,
            flip,
        } => {
            info!("Scaling {} -> {}", input.display(), output.display());
            cmd_scale(&input, &output, src_size, dst_size, flip)?;
        }
        Commands::Repack {
            input,
            output,
            spatial_id,
            json,
        } => {
            info!("Repacking {} -> {}", input.display(), output.display());
            cmd_repack(&input, &output, spatial_id, json)?;
        }
        Commands::Replay {
            stream,
            input,
            output,
            size,
            config,
            encode_size,
            keyframe_every,
            json,
        } => {
            info!(
                "Replaying {} through {} -> {}",
                input.display(),
                stream.display(),
                output.display()
            );
            cmd_replay(
                &stream,
                &input,
                &output,
                size,
                config.as_ref(),
                encode_size,
                keyframe_every,
                json,
            )?;
        }
    }

    Ok(())
}

/// Parse a `WIDTHxHEIGHT` size argument
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got '{}'", s));
    }
    Ok((w, h))
}

fn cmd_scale(
    input: &PathBuf,
    output: &PathBuf,
    src_size: (u32, u32),
    dst_size: (u32, u32),
    flip: bool,
) -> anyhow::Result<()> {
    let (sw, sh) = (src_size.0 as usize, src_size.1 as usize);
    let (dw, dh) = (dst_size.0 as usize, dst_size.1 as usize);
    let src_frame = i420_frame_size(sw, sh);
    let dst_frame = i420_frame_size(dw, dh);

    let data = fs::read(input).map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    if data.len() % src_frame != 0 {
        return Err(anyhow::anyhow!(
            "Input size {} is not a multiple of the {}x{} frame size {}",
            data.len(),
            sw,
            sh,
            src_frame
        ));
    }

    let src_height = if flip { -(sh as i32) } else { sh as i32 };
    let mut out = vec![0u8; data.len() / src_frame * dst_frame];

    for (frame, dst) in data
        .chunks_exact(src_frame)
        .zip(out.chunks_exact_mut(dst_frame))
    {
        let src = I420Planes::from_packed(frame, sw, sh)?;
        let mut dst = I420PlanesMut::from_packed(dst, dw, dh)?;
        scale_i420(&src, sw as i32, src_height, &mut dst, dw as i32, dh as i32)?;
    }

    fs::write(output, &out).map_err(|e| anyhow::anyhow!("Failed to write output: {}", e))?;

    println!(
        "Scaled {} frames {}x{} -> {}x{}",
        data.len() / src_frame,
        sw,
        sh,
        dw,
        dh
    );
    Ok(())
}

/// Summary of a repack run
#[derive(Debug, Default, Serialize)]
struct RepackSummary {
    input_units: usize,
    parameter_sets: usize,
    layers: usize,
    idr_layers: usize,
    p_layers: usize,
    bytes_out: usize,
}

impl RepackSummary {
    fn record(&mut self, layer: &LayerBitstream) {
        self.layers += 1;
        self.bytes_out += layer.total_len();
        if layer.is_key_frame() {
            self.idr_layers += 1;
        } else {
            self.p_layers += 1;
        }
    }
}

fn cmd_repack(input: &PathBuf, output: &PathBuf, spatial_id: u8, json: bool) -> anyhow::Result<()> {
    let data = fs::read(input).map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    let units = split_output_units(&data);
    if units.is_empty() {
        return Err(anyhow::anyhow!("No NAL units found in input"));
    }

    let mut repacker = Repacker::new(spatial_id)?;
    let mut summary = RepackSummary {
        input_units: units.len(),
        ..Default::default()
    };
    let mut out = Vec::with_capacity(data.len() + units.len() * 16);
    let mut scratch = Vec::new();

    for unit in &units {
        scratch.resize(required_output_capacity(unit.len(), repacker.cache()), 0);
        match repacker.repack(unit, &mut scratch)? {
            RepackOutcome::ParameterSetsCached => {
                debug!("Cached {} bytes of parameter sets", unit.len());
                summary.parameter_sets += 1;
            }
            RepackOutcome::Layer(layer) => {
                out.extend_from_slice(&scratch[..layer.total_len()]);
                summary.record(&layer);
            }
        }
    }

    fs::write(output, &out).map_err(|e| anyhow::anyhow!("Failed to write output: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Input units:     {}", summary.input_units);
        println!("Parameter sets:  {}", summary.parameter_sets);
        println!(
            "Layers:          {} ({} IDR, {} P)",
            summary.layers, summary.idr_layers, summary.p_layers
        );
        println!("Bytes written:   {}", summary.bytes_out);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_replay(
    stream: &PathBuf,
    input: &PathBuf,
    output: &PathBuf,
    size: (u32, u32),
    config: Option<&PathBuf>,
    encode_size: Option<(u32, u32)>,
    keyframe_every: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut encoder_config = match config {
        Some(path) => EncoderConfig::from_json_file(path)?,
        None => EncoderConfig::new(size.0, size.1),
    };
    if let Some((w, h)) = encode_size {
        encoder_config.width = w;
        encoder_config.height = h;
    }

    let captured = fs::read(stream).map_err(|e| anyhow::anyhow!("Failed to read stream: {}", e))?;
    let factory = ReplayEncoderFactory::from_annex_b(&captured)?;
    let max_unit = factory.units().iter().map(|u| u.len()).max().unwrap_or(0);
    let mut session = EncoderSession::new(factory);
    session.open(encoder_config)?;

    let (sw, sh) = (size.0 as usize, size.1 as usize);
    let frame_size = i420_frame_size(sw, sh);
    let data = fs::read(input).map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    let frame_rate = session.config().frame_rate.max(1) as u64;

    let mut out = Vec::new();
    let mut layer_buf = vec![0u8; max_unit + PARAM_SET_CAPACITY + SVC_PREFIX_LEN];

    for (n, frame) in data.chunks_exact(frame_size).enumerate() {
        let n = n as u64;
        if let Some(every) = keyframe_every {
            if n > 0 && every > 0 && n % every == 0 {
                session.insert_key_frame()?;
            }
        }

        let picture = SourcePicture::from_packed(frame, size.0, size.1, n * 1000 / frame_rate)?;
        session.encode_frame(&picture)?;
        let layer = session.get_bitstream(&mut layer_buf)?;
        out.extend_from_slice(&layer_buf[..layer.total_len()]);
    }

    fs::write(output, &out).map_err(|e| anyhow::anyhow!("Failed to write output: {}", e))?;
    session.close()?;

    let stats = session.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("Frames submitted: {}", stats.frames_submitted);
        println!(
            "Layers emitted:   {} ({} IDR, {} P)",
            stats.layers_emitted, stats.idr_frames, stats.p_frames
        );
        println!("Bytes written:    {}", stats.bytes_output);
        println!("Encoder restarts: {}", stats.reopen_count);
    }
    std::io::stdout().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("64X48"), Ok((64, 48)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("axb").is_err());
    }
}
