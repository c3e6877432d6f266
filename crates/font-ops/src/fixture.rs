//! Minimal in-memory fonts for tests.
//!
//! Every font carries `maxp`, a `cmap` from `Cmap::from_mappings` and, unless
//! glyph names are disabled, a version 2.0 `post`. [`FontFixture::with_outlines`]
//! adds TrueType outlines with their `head`, `hhea` and `hmtx`.

use read_fonts::tables::glyf::CurvePoint;
use write_fonts::{
    FontBuilder,
    tables::{
        cmap::Cmap,
        glyf::{Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        head::{Flags, Head, MacStyle},
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        post::Post,
    },
    types::{FWord, Fixed, GlyphId, LongDateTime, Tag, UfWord},
};

/// Longest glyph name a `post` table can store.
const MAX_GLYPH_NAME_LEN: usize = 255;

/// Builder for a tiny font with named glyphs and a cmap.
///
/// Glyph 0 is always `.notdef`; the names passed to [`FontFixture::new`]
/// follow in order.
#[derive(Debug, Clone)]
pub struct FontFixture {
    names: Vec<String>,
    cmap: Vec<(char, GlyphId)>,
    glyph_names: bool,
    outlines: bool,
    extra_tables: Vec<(Tag, Vec<u8>)>,
}

impl FontFixture {
    /// # Panics
    ///
    /// Panics if a name is longer than `post` can store.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec![".notdef".to_string()];
        all.extend(names.into_iter().map(Into::into));
        if let Some(long) = all.iter().find(|name| name.len() > MAX_GLYPH_NAME_LEN) {
            panic!("glyph name of {} bytes does not fit in post: {long}", long.len());
        }
        Self {
            names: all,
            cmap: Vec::new(),
            glyph_names: true,
            outlines: false,
            extra_tables: Vec::new(),
        }
    }

    /// Map a character to the glyph with the given name.
    ///
    /// # Panics
    ///
    /// Panics if no glyph has that name.
    pub fn map(mut self, ch: char, name: &str) -> Self {
        let gid = self
            .names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("fixture has no glyph named {name}"));
        self.cmap.retain(|(mapped, _)| *mapped != ch);
        self.cmap.push((ch, GlyphId::new(gid as u32)));
        self
    }

    /// Map every character of `text` to the glyph of the same name.
    pub fn map_letters(mut self, text: &str) -> Self {
        for ch in text.chars() {
            self = self.map(ch, &ch.to_string());
        }
        self
    }

    /// Map a code point to the glyph with the given name.
    ///
    /// # Panics
    ///
    /// Panics if the code point is not a Unicode scalar value or no glyph has
    /// that name.
    pub fn map_code_point(self, code_point: u32, name: &str) -> Self {
        let ch = char::from_u32(code_point)
            .unwrap_or_else(|| panic!("U+{code_point:04X} is not a scalar value"));
        self.map(ch, name)
    }

    /// Omit the `post` table so the font carries no glyph names.
    pub fn without_glyph_names(mut self) -> Self {
        self.glyph_names = false;
        self
    }

    /// Give every glyph but `.notdef` a one-contour outline.
    pub fn with_outlines(mut self) -> Self {
        self.outlines = true;
        self
    }

    pub fn with_raw_table(mut self, tag: Tag, data: Vec<u8>) -> Self {
        self.extra_tables.push((tag, data));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut builder = FontBuilder::new();
        builder.add_table(&self.maxp()).expect("maxp");
        let cmap = Cmap::from_mappings(self.cmap.iter().copied()).expect("cmap");
        builder.add_table(&cmap).expect("cmap");
        if self.glyph_names {
            let post = Post::new_v2(self.names.iter().map(String::as_str));
            builder.add_table(&post).expect("post");
        }
        if self.outlines {
            self.add_outlines(&mut builder);
        }
        for (tag, data) in &self.extra_tables {
            builder.add_raw(*tag, data.clone());
        }
        builder.build()
    }

    fn num_glyphs(&self) -> u16 {
        self.names.len() as u16
    }

    fn maxp(&self) -> Maxp {
        if !self.outlines {
            return Maxp::new(self.num_glyphs());
        }
        Maxp {
            num_glyphs: self.num_glyphs(),
            max_points: Some(4),
            max_contours: Some(1),
            max_composite_points: Some(0),
            max_composite_contours: Some(0),
            max_zones: Some(1),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(0),
            max_component_depth: Some(0),
        }
    }

    fn add_outlines(&self, builder: &mut FontBuilder) {
        let glyphs: Vec<Glyph> = (0..self.names.len())
            .map(|gid| if gid == 0 { Glyph::Empty } else { Glyph::Simple(outline(gid)) })
            .collect();

        let mut glyf_builder = GlyfLocaBuilder::new();
        for glyph in &glyphs {
            glyf_builder.add_glyph(glyph).expect("glyph");
        }
        let (glyf, loca, loca_format) = glyf_builder.build();

        let h_metrics: Vec<LongMetric> = glyphs
            .iter()
            .map(|glyph| {
                let bbox = glyph.bbox().unwrap_or_default();
                LongMetric { advance: (bbox.x_max + 100) as u16, side_bearing: bbox.x_min }
            })
            .collect();
        let bbox = glyphs.iter().filter_map(Glyph::bbox).reduce(|a, b| a.union(b)).unwrap_or_default();
        let advance_width_max = h_metrics.iter().map(|m| m.advance).max().unwrap_or_default();

        let head = Head {
            font_revision: Fixed::from_f64(1.0),
            checksum_adjustment: 0,
            magic_number: 0x5F0F3CF5,
            flags: Flags::empty(),
            units_per_em: 1000,
            created: LongDateTime::new(0),
            modified: LongDateTime::new(0),
            x_min: bbox.x_min,
            y_min: bbox.y_min,
            x_max: bbox.x_max,
            y_max: bbox.y_max,
            mac_style: MacStyle::empty(),
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: match loca_format {
                LocaFormat::Short => 0,
                LocaFormat::Long => 1,
            },
        };
        let hhea = Hhea {
            ascender: FWord::new(bbox.y_max),
            descender: FWord::new(0),
            line_gap: FWord::new(0),
            advance_width_max: UfWord::new(advance_width_max),
            min_left_side_bearing: FWord::new(bbox.x_min),
            min_right_side_bearing: FWord::new(0),
            x_max_extent: FWord::new(bbox.x_max),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: h_metrics.len() as u16,
        };

        builder.add_table(&head).expect("head");
        builder.add_table(&hhea).expect("hhea");
        builder.add_table(&Hmtx { h_metrics, left_side_bearings: Vec::new() }).expect("hmtx");
        builder.add_table(&glyf).expect("glyf");
        builder.add_table(&loca).expect("loca");
    }
}

/// A quadrilateral with one off-curve corner; size and side vary with `gid`.
fn outline(gid: usize) -> SimpleGlyph {
    let step = gid as i16;
    let x0 = if gid % 2 == 0 { 40 } else { -20 };
    let (width, height) = (300 + 97 * step, 700 + 3 * step);
    let mut glyph = SimpleGlyph {
        contours: vec![Contour::from(vec![
            CurvePoint::on_curve(x0, 0),
            CurvePoint::on_curve(x0 + width, 0),
            CurvePoint::off_curve(x0 + width, height),
            CurvePoint::on_curve(x0, height),
        ])],
        ..SimpleGlyph::default()
    };
    glyph.recompute_bounding_box();
    glyph
}
