use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use fast_int_convolution as fic;
use fast_int_convolution::{Layout, Rect, Region, RegionMut};
use image::{ColorType, DynamicImage, ImageReader};
use log::{debug, info, warn};

mod structs;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
#[clap(disable_help_flag = true)]
struct Cli {
    #[clap(long, action = clap::ArgAction::HelpLong)]
    help: Option<bool>,

    /// Path to source image file
    #[clap(value_parser)]
    source_path: PathBuf,

    /// Path to result image file
    #[clap(value_parser)]
    destination_path: Option<PathBuf>,

    /// Mantissas of convolution mask, row by row, separated by comma.
    /// 3x3 blur is used by default.
    #[clap(short, long, value_parser, value_delimiter = ',', allow_negative_numbers = true)]
    mask: Option<Vec<i16>>,

    /// Width of convolution mask, height is calculated from count of mantissas
    #[clap(long, value_parser, default_value_t = 3)]
    mask_width: usize,

    /// Every mantissa of the mask is divided by 2^exponent
    #[clap(short, long, value_parser, default_value_t = 4)]
    exponent: u32,

    /// Added to every result of convolution
    #[clap(long, value_parser, default_value_t = 0, allow_negative_numbers = true)]
    offset: i32,

    /// Reduce height of the image by given factor instead of convolution
    #[clap(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    reduce: Option<u32>,

    /// Family of kernels
    #[clap(short, long, value_enum, default_value_t = structs::Kernel::Portable)]
    kernel: structs::Kernel,

    /// CPU extensions used by kernels, detected automatically by default
    #[clap(long, value_enum)]
    cpu: Option<structs::Cpu>,

    /// Overwrite destination file
    #[clap(short, long, action)]
    overwrite: bool,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

struct SourceImage {
    width: u32,
    height: u32,
    bands: usize,
    buffer: Vec<u8>,
    color_type: ColorType,
}

fn main() -> Result<()> {
    let cli: Cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let kernels = create_kernels(cli)?;
    let src_image = open_source_image(cli)?;
    let (buffer, height) = match cli.reduce {
        Some(factor) => reduce(&kernels, &src_image, factor)?,
        None => (convolve(cli, &kernels, &src_image)?, src_image.height),
    };
    save_result(cli, &buffer, src_image.width, height, src_image.color_type)
}

fn create_kernels(cli: &Cli) -> Result<fic::Kernels> {
    let cpu_extensions = match cli.cpu {
        Some(cpu) => cpu.try_into()?,
        None => fic::Kernels::detected().cpu_extensions(),
    };
    let kernels = fic::Kernels::new(cpu_extensions, cli.kernel.into())
        .with_context(|| "Failed to select kernels")?;
    info!(
        "Use {:?} kernels with {:?} CPU extensions",
        kernels.implementation(),
        kernels.cpu_extensions()
    );
    Ok(kernels)
}

fn open_source_image(cli: &Cli) -> Result<SourceImage> {
    let source_path = &cli.source_path;
    debug!("Opening the source image {:?}", source_path);
    let image = ImageReader::open(source_path)
        .with_context(|| format!("Failed to read source file from {:?}", source_path))?
        .decode()
        .with_context(|| "Failed to decode source image")?;

    let width = image.width();
    let height = image.height();
    let (buffer, bands, color_type) = into_8bit(image);
    Ok(SourceImage {
        width,
        height,
        bands,
        buffer,
        color_type,
    })
}

/// Converts any image into image with 8-bit components.
fn into_8bit(image: DynamicImage) -> (Vec<u8>, usize, ColorType) {
    let color_type = image.color();
    match color_type {
        ColorType::L8 | ColorType::L16 => (image.to_luma8().into_raw(), 1, ColorType::L8),
        ColorType::La8 | ColorType::La16 => {
            (image.to_luma_alpha8().into_raw(), 2, ColorType::La8)
        }
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
            (image.to_rgb8().into_raw(), 3, ColorType::Rgb8)
        }
        _ => (image.to_rgba8().into_raw(), 4, ColorType::Rgba8),
    }
}

fn convolve(cli: &Cli, kernels: &fic::Kernels, src_image: &SourceImage) -> Result<Vec<u8>> {
    let (mask, mask_width) = match &cli.mask {
        Some(mask) => (mask.clone(), cli.mask_width),
        None => (vec![1, 2, 1, 2, 4, 2, 1, 2, 1], 3),
    };
    if mask_width == 0 || mask.len() % mask_width != 0 {
        return Err(anyhow!(
            "Count of mantissas ({}) is not a multiple of the mask width ({})",
            mask.len(),
            mask_width
        ));
    }
    let mask_height = mask.len() / mask_width;

    let valid = Rect::new(0, 0, src_image.width, src_image.height);
    let bands = src_image.bands;
    let input = Region::from_slice(valid, bands, &src_image.buffer)
        .with_context(|| "Failed to create source region")?;
    let taps = fic::TapSet::from_mask(
        mask_width,
        mask_height,
        &mask,
        input.stride(),
        bands,
        cli.exponent,
        cli.offset,
    )
    .with_context(|| "Invalid convolution mask")?;
    if cli.kernel.is_fixed_isa() && !taps.fits_i16_accumulator() {
        warn!("Partial sums of the mask don't fit into 16 bits, result may be inexact");
    }

    // Pixels closer to the border than a half of the mask are copied as is
    let layout = Layout::packed(valid, bands)?;
    let mut out = RegionMut::from_vec(layout, src_image.buffer.clone())?;
    let rect = valid.shrink(mask_width as u32 / 2, mask_height as u32 / 2);
    if rect.is_empty() {
        warn!("Image is smaller than the mask, nothing to convolve");
        return Ok(out.into_vec());
    }

    debug!(
        "Convolve {}x{} pixels with {} non-zero taps",
        rect.width,
        rect.height,
        taps.nnz()
    );
    kernels.convolve(&mut out, &input, rect, rect.width as usize * bands, &taps);
    Ok(out.into_vec())
}

fn reduce(
    kernels: &fic::Kernels,
    src_image: &SourceImage,
    factor: u32,
) -> Result<(Vec<u8>, u32)> {
    let dst_height = src_image.height / factor;
    if dst_height == 0 {
        return Err(anyhow!(
            "Height of the image ({}) is less than the reduce factor ({})",
            src_image.height,
            factor
        ));
    }
    let weights = vec![1. / factor as f64; factor as usize];
    let taps = fic::ReductionTaps::from_weights(&weights)
        .with_context(|| "Failed to create reduction taps")?;

    let row_size = src_image.width as usize * src_image.bands;
    let src_block_size = row_size * factor as usize;
    let mut buffer = vec![0u8; row_size * dst_height as usize];

    debug!(
        "Reduce height of the image from {} to {}",
        src_image.height, dst_height
    );
    if row_size > 0 {
        let src_blocks = src_image.buffer.chunks_exact(src_block_size);
        for (dst_row, src_block) in buffer.chunks_exact_mut(row_size).zip(src_blocks) {
            kernels.reduce_vertical(dst_row, src_block, row_size, row_size, &taps);
        }
    }
    Ok((buffer, dst_height))
}

fn save_result(
    cli: &Cli,
    buffer: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
) -> Result<()> {
    let result_path = if let Some(path) = cli.destination_path.clone() {
        path
    } else {
        let mut path = PathBuf::from("./");
        let ext = cli
            .source_path
            .extension()
            .unwrap_or_else(|| OsStr::new("png"));
        path.push("result");
        path.set_extension(ext);
        path
    };
    if result_path.exists() && !cli.overwrite {
        return Err(anyhow!(
            "Destination path {:?} already exists.",
            result_path
        ));
    };

    debug!("Save the result image into the file {:?}", result_path);
    image::save_buffer(result_path, buffer, width, height, color_type)
        .with_context(|| "Failed to save the result image")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn reduce_by_two() {
        let src_image = SourceImage {
            width: 3,
            height: 4,
            bands: 1,
            buffer: vec![0, 10, 255, 2, 20, 255, 100, 0, 7, 200, 0, 8],
            color_type: ColorType::L8,
        };
        let kernels = *fic::Kernels::detected();
        let (buffer, height) = reduce(&kernels, &src_image, 2).unwrap();
        assert_eq!(height, 2);
        assert_eq!(buffer, vec![1, 15, 255, 150, 0, 8]);
    }
}
