//! Rank-matched reconstruction of one output buffer.

use super::index::SortedPixelList;
use super::raster::{CHANNELS, ExchangeError, RasterBuffer};
use super::sample::{brightness, is_visible};
use rayon::prelude::*;

/// Rebuild `target` from the pixels of another image.
///
/// `own` is the sorted, tiled list extracted from `target` itself and is
/// only used to rank each pixel; `other` supplies the pixel copied into
/// that rank's position. Transparent positions stay `(0, 0, 0, 0)`.
///
/// Rows are processed in parallel. Each row only reads the two lists and
/// writes its own slice of the output, so the result does not depend on
/// scheduling.
pub fn rebuild(
    target: &RasterBuffer,
    own: &SortedPixelList,
    other: &SortedPixelList,
) -> Result<RasterBuffer, ExchangeError> {
    let mut out = RasterBuffer::blank(target.width, target.height)?;
    let stride = target.stride();
    if stride == 0 {
        return Ok(out);
    }

    out.data
        .par_chunks_mut(stride)
        .zip(target.data.par_chunks(stride))
        .for_each(|(dst_row, src_row)| rebuild_row(dst_row, src_row, own, other));

    Ok(out)
}

fn rebuild_row(dst: &mut [u8], src: &[u8], own: &SortedPixelList, other: &SortedPixelList) {
    for (dst_px, src_px) in dst
        .chunks_exact_mut(CHANNELS)
        .zip(src.chunks_exact(CHANNELS))
    {
        if !is_visible(src_px[3]) {
            continue;
        }
        let rank = own.lower_bound(brightness(src_px[0], src_px[1], src_px[2]));
        dst_px.copy_from_slice(&other.sample_at(rank).rgba());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::sample::extract_samples;
    use crate::test_helpers::{pixels_of, raster};

    fn indexed(buf: &RasterBuffer) -> SortedPixelList {
        let mut list = SortedPixelList::from_samples(extract_samples(buf));
        list.tile_to(buf.pixel_count());
        list
    }

    #[test]
    fn transparent_positions_stay_zeroed() {
        let target = raster(2, 1, &[[200, 200, 200, 10], [50, 50, 50, 255]]);
        let source = raster(2, 1, &[[9, 9, 9, 255], [250, 250, 250, 255]]);
        let out = rebuild(&target, &indexed(&target), &indexed(&source)).unwrap();
        assert_eq!(pixels_of(&out)[0], [0, 0, 0, 0]);
        assert_ne!(pixels_of(&out)[1], [0, 0, 0, 0]);
    }

    #[test]
    fn darkest_takes_darkest_brightest_takes_brightest() {
        let target = raster(3, 1, &[[200, 200, 200, 255], [0, 0, 0, 255], [100, 100, 100, 255]]);
        let source = raster(3, 1, &[[1, 2, 3, 255], [250, 0, 250, 255], [90, 90, 0, 255]]);
        let out = rebuild(&target, &indexed(&target), &indexed(&source)).unwrap();
        // Source ranks: (1,2,3) = 1.815 < (90,90,0) = 79.74 < (250,0,250) = 103.25.
        assert_eq!(
            pixels_of(&out),
            vec![[250, 0, 250, 255], [1, 2, 3, 255], [90, 90, 0, 255]]
        );
    }

    #[test]
    fn empty_source_list_yields_sentinel_pixels() {
        let target = raster(2, 1, &[[10, 20, 30, 255], [40, 50, 60, 255]]);
        let out = rebuild(&target, &indexed(&target), &SortedPixelList::default()).unwrap();
        assert_eq!(pixels_of(&out), vec![[0, 0, 0, 0], [0, 0, 0, 0]]);
    }

    #[test]
    fn rows_rebuild_independently() {
        // Same pixels laid out as one row and as one column give the same
        // per-pixel answer.
        let px = [[5, 5, 5, 255], [200, 1, 1, 255], [7, 90, 7, 255], [0, 0, 0, 0]];
        let src = [[1, 1, 1, 255], [2, 2, 2, 255], [3, 3, 3, 255], [4, 4, 4, 255]];
        let row = raster(4, 1, &px);
        let col = raster(1, 4, &px);
        let out_row = rebuild(&row, &indexed(&row), &indexed(&raster(4, 1, &src))).unwrap();
        let out_col = rebuild(&col, &indexed(&col), &indexed(&raster(1, 4, &src))).unwrap();
        assert_eq!(pixels_of(&out_row), pixels_of(&out_col));
    }

    #[test]
    fn zero_width_buffer_rebuilds_to_empty() {
        let target = RasterBuffer::new(0, 3, Vec::new());
        let out = rebuild(&target, &SortedPixelList::default(), &SortedPixelList::default())
            .unwrap();
        assert_eq!((out.width, out.height), (0, 3));
        assert!(out.data.is_empty());
    }
}
