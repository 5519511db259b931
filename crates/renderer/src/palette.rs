//! Colour palettes. Geometry refers to abstract materials; the active palette decides what
//! colour each material is, so switching day and night is a palette swap.

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}

/// Which palette family a piece of content belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeOfDay {
    #[default]
    Day,
    Night,
}

impl TimeOfDay {
    pub fn toggled(self) -> Self {
        match self {
            TimeOfDay::Day => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Day,
        }
    }
}

/// Surface kinds referenced by meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Grass,
    Runway,
    Marking,
    Hangar,
    Roof,
    Foliage,
    Trunk,
    Fuselage,
    Wing,
    Canopy,
    Light,
    Smoke,
}

impl Material {
    pub const COUNT: usize = 12;

    pub const ALL: [Material; Self::COUNT] = [
        Material::Grass,
        Material::Runway,
        Material::Marking,
        Material::Hangar,
        Material::Roof,
        Material::Foliage,
        Material::Trunk,
        Material::Fuselage,
        Material::Wing,
        Material::Canopy,
        Material::Light,
        Material::Smoke,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Two tones per material; volumes dither between them by light intensity, flats use `lit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub lit: Rgb,
    pub shade: Rgb,
}

impl Swatch {
    pub const fn new(lit: Rgb, shade: Rgb) -> Self {
        Self { lit, shade }
    }

    pub const fn solid(color: Rgb) -> Self {
        Self { lit: color, shade: color }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    pub time: TimeOfDay,
    /// Clear colour of raster targets (the sky).
    pub background: Rgb,
    pub swatches: [Swatch; Material::COUNT],
    /// HUD text and symbology.
    pub hud: Rgb,
    /// Colour of the shadow/outline drawn behind HUD text.
    pub hud_effect: Rgb,
}

impl Palette {
    pub fn swatch(&self, material: Material) -> Swatch {
        self.swatches[material.index()]
    }

    pub fn for_time(time: TimeOfDay) -> Self {
        match time {
            TimeOfDay::Day => Self::day(),
            TimeOfDay::Night => Self::night(),
        }
    }

    pub fn day() -> Self {
        Self {
            name: "day",
            time: TimeOfDay::Day,
            background: Rgb::new(120, 176, 232),
            swatches: [
                Swatch::new(Rgb::new(92, 148, 64), Rgb::new(64, 112, 48)),
                Swatch::new(Rgb::new(96, 96, 104), Rgb::new(72, 72, 80)),
                Swatch::solid(Rgb::new(236, 236, 228)),
                Swatch::new(Rgb::new(196, 188, 168), Rgb::new(128, 120, 108)),
                Swatch::new(Rgb::new(164, 64, 52), Rgb::new(104, 40, 36)),
                Swatch::new(Rgb::new(52, 120, 56), Rgb::new(28, 72, 36)),
                Swatch::new(Rgb::new(120, 84, 52), Rgb::new(80, 56, 36)),
                Swatch::new(Rgb::new(232, 232, 224), Rgb::new(148, 152, 160)),
                Swatch::new(Rgb::new(212, 60, 44), Rgb::new(136, 36, 32)),
                Swatch::new(Rgb::new(72, 116, 168), Rgb::new(40, 64, 104)),
                Swatch::solid(Rgb::new(255, 236, 160)),
                Swatch::new(Rgb::new(236, 236, 236), Rgb::new(180, 180, 188)),
            ],
            hud: Rgb::new(96, 255, 96),
            hud_effect: Rgb::new(0, 48, 0),
        }
    }

    pub fn night() -> Self {
        Self {
            name: "night",
            time: TimeOfDay::Night,
            background: Rgb::new(12, 16, 40),
            swatches: [
                Swatch::new(Rgb::new(20, 36, 24), Rgb::new(12, 24, 16)),
                Swatch::new(Rgb::new(36, 36, 44), Rgb::new(24, 24, 32)),
                Swatch::solid(Rgb::new(120, 120, 132)),
                Swatch::new(Rgb::new(56, 56, 72), Rgb::new(32, 32, 44)),
                Swatch::new(Rgb::new(56, 28, 36), Rgb::new(36, 20, 28)),
                Swatch::new(Rgb::new(16, 40, 28), Rgb::new(8, 24, 16)),
                Swatch::new(Rgb::new(40, 28, 24), Rgb::new(24, 16, 16)),
                Swatch::new(Rgb::new(100, 104, 124), Rgb::new(56, 60, 76)),
                Swatch::new(Rgb::new(96, 36, 44), Rgb::new(60, 24, 32)),
                Swatch::new(Rgb::new(40, 64, 112), Rgb::new(24, 36, 72)),
                Swatch::solid(Rgb::new(255, 220, 96)),
                Swatch::new(Rgb::new(88, 88, 104), Rgb::new(56, 56, 72)),
            ],
            hud: Rgb::new(255, 176, 64),
            hud_effect: Rgb::new(40, 16, 0),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::day()
    }
}
