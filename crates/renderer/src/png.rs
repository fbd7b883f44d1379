//! PNG encoding for rendered figures.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the figure has ≤256 unique
//!   colors (flat-colored overlays, test figures).
//! - **RGBA PNG (color type 6)**: the usual case for imagery.
//!
//! Use [`encode_auto`] for automatic mode selection, or [`encode`] for
//! explicit RGBA encoding.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::raster::Raster;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

/// Encode with automatic format selection.
pub fn encode_auto(raster: &Raster) -> RenderResult<Vec<u8>> {
    match extract_palette(raster.pixels()) {
        Some((palette, indices)) => encode_indexed(raster.width(), raster.height(), &palette, &indices),
        None => encode(raster),
    }
}

/// Encode as an 8-bit RGBA PNG.
pub fn encode(raster: &Raster) -> RenderResult<Vec<u8>> {
    let mut png = Vec::with_capacity(raster.pixels().len() / 2);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(raster.width(), raster.height(), 6));

    let idat = deflate_scanlines(raster.pixels(), raster.width() as usize * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode and write to `path`.
pub fn save(raster: &Raster, path: &Path) -> RenderResult<()> {
    let bytes = encode_auto(raster)?;
    std::fs::write(path, bytes)
        .map_err(|e| RenderError::Encode(format!("{}: {}", path.display(), e)))
}

fn encode_indexed(
    width: u32,
    height: u32,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> RenderResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS holds one alpha per palette entry
    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression
    data.push(0); // filter
    data.push(0); // interlace
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> RenderResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1));
    for row in data.chunks_exact(row_bytes) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

/// Palette and per-pixel indices, or `None` when there are too many colors.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let num_pixels = pixels.len() / 4;

    let colors: Vec<u32> = if num_pixels >= PARALLEL_THRESHOLD {
        let chunk_size = (num_pixels / rayon::current_num_threads()).max(256) * 4;
        let sets: Vec<HashSet<u32>> = pixels
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut local = HashSet::with_capacity(MAX_PALETTE_SIZE);
                for px in chunk.chunks_exact(4) {
                    local.insert(pack(px));
                    if local.len() > MAX_PALETTE_SIZE {
                        break;
                    }
                }
                local
            })
            .collect();
        let mut merged = Vec::new();
        let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
        for color in sets.into_iter().flatten() {
            if seen.insert(color) {
                merged.push(color);
                if merged.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
        }
        merged
    } else {
        let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
        let mut ordered = Vec::new();
        for px in pixels.chunks_exact(4) {
            let color = pack(px);
            if seen.insert(color) {
                ordered.push(color);
                if ordered.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
        }
        ordered
    };

    let index_of: HashMap<u32, u8> = colors
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as u8))
        .collect();
    let palette = colors.iter().map(|c| c.to_le_bytes()).collect();
    let indices = pixels
        .par_chunks(4)
        .map(|px| index_of.get(&pack(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_palette_simple() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];

        let (palette, indices) = extract_palette(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices.len(), 4);
        assert_eq!(indices[0], indices[3]);
        assert_eq!(palette[indices[1] as usize], [0, 255, 0, 255]);
    }

    #[test]
    fn test_extract_palette_parallel_path() {
        // 128x128 crosses PARALLEL_THRESHOLD
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let idx = ((x / 8) + (y / 8)) % 50;
                pixels.extend_from_slice(&[(idx * 5) as u8, 100, 200, 255]);
            }
        }

        let (palette, indices) = extract_palette(&pixels).unwrap();
        assert_eq!(palette.len(), 31);
        assert_eq!(indices.len(), 128 * 128);
        for (px, &i) in pixels.chunks_exact(4).zip(&indices) {
            assert_eq!(&palette[i as usize][..], px);
        }
    }

    #[test]
    fn test_too_many_colors() {
        let pixels: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255])
            .collect();
        assert!(extract_palette(&pixels).is_none());
    }

    #[test]
    fn test_chunk_crc() {
        let mut out = Vec::new();
        write_chunk(&mut out, b"IEND", &[]);
        // Well-known IEND CRC
        assert_eq!(&out[8..12], &[0xAE, 0x42, 0x60, 0x82]);
    }
}
