//! Reversing the WOFF2 `glyf`/`loca` and `hmtx` transforms.

use anyhow::{Context, Result, bail, ensure};

use crate::decode::Reader;

// simple glyph flags
const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;
const OVERLAP_SIMPLE: u8 = 0x40;

// composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

/// A rebuilt `glyf`/`loca` pair.
#[derive(Debug)]
pub(crate) struct Glyphs {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    /// `xMin` of every glyph, 0 for empty ones.
    pub x_mins: Vec<i16>,
}

#[derive(Debug, Clone, Copy)]
struct Point {
    x: i16,
    y: i16,
    on_curve: bool,
}

/// Substreams of a transformed `glyf` table.
struct Streams<'a> {
    n_contours: Reader<'a>,
    n_points: Reader<'a>,
    flags: Reader<'a>,
    glyphs: Reader<'a>,
    composites: Reader<'a>,
    bboxes: Reader<'a>,
    instructions: Reader<'a>,
    bbox_bitmap: &'a [u8],
    overlap_bitmap: Option<&'a [u8]>,
}

/// Rebuild `glyf` and `loca` from a transformed `glyf` table.
///
/// `loca_length` is the original length recorded for `loca`.
pub(crate) fn reconstruct_glyf(data: &[u8], loca_length: u32) -> Result<Glyphs> {
    let mut header = Reader::new(data);
    let _reserved: u16 = header.read()?;
    let option_flags: u16 = header.read()?;
    let num_glyphs = usize::from(header.read::<u16>()?);
    let index_format: u16 = header.read()?;
    ensure!(index_format <= 1, "invalid loca index format {index_format}");
    let mut sizes = [0usize; 7];
    for size in &mut sizes {
        *size = header.read::<u32>()? as usize;
    }

    let offset_size = if index_format == 0 { 2 } else { 4 };
    ensure!(
        (num_glyphs + 1) * offset_size == loca_length as usize,
        "loca length {loca_length} does not fit {num_glyphs} glyphs"
    );

    let bitmap_len = num_glyphs.div_ceil(32) * 4;
    let n_contours = Reader::new(header.bytes(sizes[0])?);
    let n_points = Reader::new(header.bytes(sizes[1])?);
    let flags = Reader::new(header.bytes(sizes[2])?);
    let glyphs = Reader::new(header.bytes(sizes[3])?);
    let composites = Reader::new(header.bytes(sizes[4])?);
    let bbox_data = header.bytes(sizes[5])?;
    ensure!(bbox_data.len() >= bitmap_len, "bbox stream is shorter than its bitmap");
    let (bbox_bitmap, bboxes) = bbox_data.split_at(bitmap_len);
    let instructions = Reader::new(header.bytes(sizes[6])?);
    let overlap_bitmap =
        if option_flags & 1 != 0 { Some(header.bytes(bitmap_len)?) } else { None };

    let mut streams = Streams {
        n_contours,
        n_points,
        flags,
        glyphs,
        composites,
        bboxes: Reader::new(bboxes),
        instructions,
        bbox_bitmap,
        overlap_bitmap,
    };

    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(num_glyphs + 1);
    let mut x_mins = Vec::with_capacity(num_glyphs);
    for gid in 0..num_glyphs {
        offsets.push(glyf.len());
        let x_min = streams.glyph(gid, &mut glyf).with_context(|| format!("glyph {gid}"))?;
        x_mins.push(x_min);
        glyf.resize(glyf.len().next_multiple_of(4), 0);
    }
    offsets.push(glyf.len());

    let mut loca = Vec::with_capacity(loca_length as usize);
    for offset in offsets {
        if index_format == 0 {
            let offset = u16::try_from(offset / 2).context("glyf is too large for short loca")?;
            loca.extend_from_slice(&offset.to_be_bytes());
        } else {
            let offset = u32::try_from(offset).context("glyf is too large")?;
            loca.extend_from_slice(&offset.to_be_bytes());
        }
    }

    Ok(Glyphs { glyf, loca, x_mins })
}

impl Streams<'_> {
    /// Append one glyph to `glyf` and return its `xMin`.
    fn glyph(&mut self, gid: usize, glyf: &mut Vec<u8>) -> Result<i16> {
        let n_contours: i16 = self.n_contours.read()?;
        let has_bbox = bit_set(self.bbox_bitmap, gid);
        match n_contours {
            0 => {
                ensure!(!has_bbox, "empty glyph has a bounding box");
                Ok(0)
            }
            -1 => {
                ensure!(has_bbox, "composite glyph has no bounding box");
                let bbox = self.bboxes.bytes(8)?;
                glyf.extend_from_slice(&n_contours.to_be_bytes());
                glyf.extend_from_slice(bbox);
                if self.components(glyf)? {
                    self.instructions(glyf)?;
                }
                Ok(i16::from_be_bytes([bbox[0], bbox[1]]))
            }
            n if n > 0 => {
                let overlap = self.overlap_bitmap.is_some_and(|bitmap| bit_set(bitmap, gid));
                self.simple_glyph(n, has_bbox, overlap, glyf)
            }
            n => bail!("invalid contour count {n}"),
        }
    }

    /// Copy composite components; returns whether instructions follow.
    fn components(&mut self, glyf: &mut Vec<u8>) -> Result<bool> {
        let mut has_instructions = false;
        loop {
            let flags: u16 = self.composites.read()?;
            has_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;

            // glyph index plus arguments
            let mut len = if flags & ARG_1_AND_2_ARE_WORDS != 0 { 6 } else { 4 };
            if flags & WE_HAVE_A_SCALE != 0 {
                len += 2;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                len += 4;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                len += 8;
            }
            glyf.extend_from_slice(&flags.to_be_bytes());
            glyf.extend_from_slice(self.composites.bytes(len)?);

            if flags & MORE_COMPONENTS == 0 {
                return Ok(has_instructions);
            }
        }
    }

    fn instructions(&mut self, glyf: &mut Vec<u8>) -> Result<()> {
        let len = self.glyphs.uint255()?;
        glyf.extend_from_slice(&len.to_be_bytes());
        glyf.extend_from_slice(self.instructions.bytes(usize::from(len))?);
        Ok(())
    }

    fn simple_glyph(
        &mut self,
        n_contours: i16,
        has_bbox: bool,
        overlap: bool,
        glyf: &mut Vec<u8>,
    ) -> Result<i16> {
        let mut end_points = Vec::with_capacity(n_contours as usize);
        let mut end_point = -1i32;
        for _ in 0..n_contours {
            end_point += i32::from(self.n_points.uint255()?);
            ensure!(end_point < 0x1_0000, "too many points");
            end_points.push(end_point as u16);
        }
        let num_points = (end_point + 1) as usize;

        let mut points = Vec::with_capacity(num_points);
        let (mut x, mut y) = (0i16, 0i16);
        for _ in 0..num_points {
            let flag: u8 = self.flags.read()?;
            let (dx, dy) = self.triplet(flag)?;
            x = x.wrapping_add(dx);
            y = y.wrapping_add(dy);
            points.push(Point { x, y, on_curve: flag & 0x80 == 0 });
        }

        let bbox = if has_bbox {
            [self.bboxes.read()?, self.bboxes.read()?, self.bboxes.read()?, self.bboxes.read()?]
        } else {
            bounding_box(&points)
        };

        glyf.extend_from_slice(&n_contours.to_be_bytes());
        for value in bbox {
            glyf.extend_from_slice(&value.to_be_bytes());
        }
        for end_point in end_points {
            glyf.extend_from_slice(&end_point.to_be_bytes());
        }
        self.instructions(glyf)?;
        encode_points(&points, overlap, glyf);
        Ok(bbox[0])
    }

    /// Decode one coordinate triplet from the glyph stream.
    fn triplet(&mut self, flag: u8) -> Result<(i16, i16)> {
        let f = i32::from(flag & 0x7F);
        let with_sign = |f: i32, value: i32| if f & 1 != 0 { value } else { -value };
        let mut byte = || self.glyphs.read::<u8>().map(i32::from);

        let (dx, dy) = if f < 10 {
            (0, with_sign(f, ((f & 14) << 7) + byte()?))
        } else if f < 20 {
            (with_sign(f, (((f - 10) & 14) << 7) + byte()?), 0)
        } else if f < 84 {
            let c = f - 20;
            let b0 = byte()?;
            (
                with_sign(f, 1 + (c & 0x30) + (b0 >> 4)),
                with_sign(f >> 1, 1 + ((c & 0x0C) << 2) + (b0 & 0x0F)),
            )
        } else if f < 120 {
            let c = f - 84;
            let (b0, b1) = (byte()?, byte()?);
            (
                with_sign(f, 1 + ((c / 12) << 8) + b0),
                with_sign(f >> 1, 1 + (((c % 12) >> 2) << 8) + b1),
            )
        } else if f < 124 {
            let (b0, b1, b2) = (byte()?, byte()?, byte()?);
            (with_sign(f, (b0 << 4) + (b1 >> 4)), with_sign(f >> 1, ((b1 & 0x0F) << 8) + b2))
        } else {
            let (b0, b1, b2, b3) = (byte()?, byte()?, byte()?, byte()?);
            (with_sign(f, (b0 << 8) + b1), with_sign(f >> 1, (b2 << 8) + b3))
        };
        Ok((dx as i16, dy as i16))
    }
}

/// Rebuild `hmtx` from its transformed form, taking omitted left side
/// bearings from the glyphs' `xMin`.
pub(crate) fn reconstruct_hmtx(data: &[u8], num_h_metrics: u16, x_mins: &[i16]) -> Result<Vec<u8>> {
    let mut reader = Reader::new(data);
    let flags: u8 = reader.read()?;
    ensure!(flags & 0xFC == 0, "reserved hmtx transform flags are set");
    ensure!(flags & 0x03 != 0, "transformed hmtx omits no side bearings");

    let num_h_metrics = usize::from(num_h_metrics);
    ensure!(
        (1..=x_mins.len()).contains(&num_h_metrics),
        "numberOfHMetrics {num_h_metrics} does not fit {} glyphs",
        x_mins.len()
    );
    let advances =
        (0..num_h_metrics).map(|_| reader.read::<u16>()).collect::<Result<Vec<_>>>()?;

    let mut hmtx = Vec::with_capacity(num_h_metrics * 2 + x_mins.len() * 2);
    for (gid, x_min) in x_mins.iter().enumerate() {
        let stored = if gid < num_h_metrics { flags & 0x01 == 0 } else { flags & 0x02 == 0 };
        let lsb = if stored { reader.read::<i16>()? } else { *x_min };
        if let Some(advance) = advances.get(gid) {
            hmtx.extend_from_slice(&advance.to_be_bytes());
        }
        hmtx.extend_from_slice(&lsb.to_be_bytes());
    }
    Ok(hmtx)
}

fn bit_set(bitmap: &[u8], gid: usize) -> bool {
    bitmap.get(gid >> 3).is_some_and(|byte| byte & (0x80 >> (gid & 7)) != 0)
}

fn bounding_box(points: &[Point]) -> [i16; 4] {
    let Some(first) = points.first() else {
        return [0; 4];
    };
    points.iter().fold([first.x, first.y, first.x, first.y], |[x0, y0, x1, y1], p| {
        [x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)]
    })
}

/// Write flags and coordinate deltas of a simple glyph.
fn encode_points(points: &[Point], overlap: bool, glyf: &mut Vec<u8>) {
    let mut flags = Vec::with_capacity(points.len());
    let mut xs = Vec::with_capacity(points.len());
    let mut ys = Vec::with_capacity(points.len());
    let mut last_flag = None;
    let mut repeat = 0u8;
    let (mut last_x, mut last_y) = (0i16, 0i16);

    for (i, point) in points.iter().enumerate() {
        let mut flag = if point.on_curve { ON_CURVE } else { 0 };
        if overlap && i == 0 {
            flag |= OVERLAP_SIMPLE;
        }
        flag |= push_delta(point.x.wrapping_sub(last_x), X_SHORT, X_SAME_OR_POSITIVE, &mut xs);
        flag |= push_delta(point.y.wrapping_sub(last_y), Y_SHORT, Y_SAME_OR_POSITIVE, &mut ys);

        if last_flag == Some(flag) && repeat != u8::MAX {
            if let Some(previous) = flags.last_mut() {
                *previous |= REPEAT;
            }
            repeat += 1;
        } else {
            if repeat != 0 {
                flags.push(repeat);
            }
            flags.push(flag);
            repeat = 0;
        }
        last_flag = Some(flag);
        last_x = point.x;
        last_y = point.y;
    }
    if repeat != 0 {
        flags.push(repeat);
    }

    glyf.extend_from_slice(&flags);
    glyf.extend_from_slice(&xs);
    glyf.extend_from_slice(&ys);
}

/// Write one delta and return its flag bits.
fn push_delta(delta: i16, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> u8 {
    if delta == 0 {
        same_or_positive
    } else if (-255..=255).contains(&delta) {
        out.push(delta.unsigned_abs() as u8);
        if delta > 0 { short | same_or_positive } else { short }
    } else {
        out.extend_from_slice(&delta.to_be_bytes());
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformed_glyf(num_glyphs: u16, index_format: u16, streams: [&[u8]; 7]) -> Vec<u8> {
        let mut data = Vec::new();
        for value in [0, 0, num_glyphs, index_format] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        for stream in streams {
            data.extend_from_slice(&(stream.len() as u32).to_be_bytes());
        }
        for stream in streams {
            data.extend_from_slice(stream);
        }
        data
    }

    #[test]
    fn test_simple_glyph_with_computed_bbox() {
        // glyph 0 empty; glyph 1 is (0,0) (100,0) on-curve, (50,80) off-curve
        let data = transformed_glyf(
            2,
            0,
            [
                &[0, 0, 0, 1],
                &[3],
                &[0x01, 0x0B, 0xD6],
                &[0, 100, 49, 79, 0],
                &[],
                &[0, 0, 0, 0],
                &[],
            ],
        );

        let glyphs = reconstruct_glyf(&data, 6).unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x50,
            0x00, 0x02,
            0x00, 0x00,
            0x31, 0x33, 0x26,
            0x64, 0x32,
            0x50,
        ];
        assert_eq!(glyphs.glyf, expected);
        assert_eq!(glyphs.loca, [0, 0, 0, 0, 0, 10]);
        assert_eq!(glyphs.x_mins, [0, 0]);
    }

    #[test]
    fn test_composite_glyph_with_instructions() {
        let data = transformed_glyf(
            1,
            1,
            [
                &[0xFF, 0xFF],
                &[],
                &[],
                &[2],
                &[0x01, 0x00, 0x00, 0x00, 0x05, 0x06],
                &[0x80, 0, 0, 0, 0xFF, 0xF6, 0x00, 0x00, 0x00, 0x5A, 0x00, 0x64],
                &[0xB0, 0x01],
            ],
        );

        let glyphs = reconstruct_glyf(&data, 8).unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0xFF, 0xFF,
            0xFF, 0xF6, 0x00, 0x00, 0x00, 0x5A, 0x00, 0x64,
            0x01, 0x00, 0x00, 0x00, 0x05, 0x06,
            0x00, 0x02, 0xB0, 0x01,
        ];
        assert_eq!(glyphs.glyf, expected);
        assert_eq!(glyphs.loca, [0, 0, 0, 0, 0, 0, 0, 20]);
        assert_eq!(glyphs.x_mins, [-10]);
    }

    #[test]
    fn test_loca_length_mismatch() {
        let data = transformed_glyf(1, 0, [&[0, 0], &[], &[], &[], &[], &[0, 0, 0, 0], &[]]);
        assert!(reconstruct_glyf(&data, 4).is_ok());
        assert!(reconstruct_glyf(&data, 8).is_err());
    }

    #[test]
    fn test_composite_without_bbox_fails() {
        let data = transformed_glyf(
            1,
            0,
            [&[0xFF, 0xFF], &[], &[], &[], &[0, 0, 0, 0, 0, 0], &[0, 0, 0, 0], &[]],
        );
        assert!(reconstruct_glyf(&data, 4).is_err());
    }

    #[test]
    fn test_repeated_flags() {
        let points: Vec<Point> =
            (1..=4).map(|i| Point { x: i * 10, y: 0, on_curve: true }).collect();
        let mut glyf = Vec::new();
        encode_points(&points, true, &mut glyf);
        // first flag carries the overlap bit, the other three repeat
        assert_eq!(glyf, [0x73, 0x33 | REPEAT, 2, 10, 10, 10, 10]);
    }

    #[test]
    fn test_hmtx_side_bearings_from_x_min() {
        // proportional side bearings omitted, monospace ones stored
        let data = [0x01, 0x01, 0xF4, 0x02, 0x58, 0x00, 0x07];
        let hmtx = reconstruct_hmtx(&data, 2, &[0, 10, -5]).unwrap();
        assert_eq!(hmtx, [0x01, 0xF4, 0x00, 0x00, 0x02, 0x58, 0x00, 0x0A, 0x00, 0x07]);
    }

    #[test]
    fn test_hmtx_without_omissions_fails() {
        assert!(reconstruct_hmtx(&[0x00, 0x01, 0xF4, 0x00, 0x00], 1, &[0]).is_err());
    }
}
