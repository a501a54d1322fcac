use crate::descriptor::{dsi_format, dsi_mode, mode_flags, DisplayMode, DsiConfig, PanelDescriptor};
use crate::models::{dsi_panel, mode, OfMatch};

const fn four_lanes(flags: u32) -> DsiConfig {
    DsiConfig {
        flags,
        format: dsi_format::RGB888,
        lanes: 4,
    }
}

static AUO_B080UAN01_MODE: [DisplayMode; 1] =
    [mode(154500, (1200, 62, 4, 62), (1920, 9, 2, 8), 60, 0)];

/// AUO B080UAN01 8" WUXGA.
pub static AUO_B080UAN01: PanelDescriptor = dsi_panel(
    &AUO_B080UAN01_MODE,
    8,
    (108, 272),
    four_lanes(dsi_mode::VIDEO | dsi_mode::CLOCK_NON_CONTINUOUS),
);

static BOE_TV080WUM_NL0_MODE: [DisplayMode; 1] = [mode(
    160000,
    (1200, 120, 20, 21),
    (1920, 21, 3, 18),
    60,
    mode_flags::NVSYNC | mode_flags::NHSYNC,
)];

/// BOE TV080WUM-NL0 8" WUXGA.
pub static BOE_TV080WUM_NL0: PanelDescriptor = dsi_panel(
    &BOE_TV080WUM_NL0_MODE,
    0,
    (107, 172),
    four_lanes(dsi_mode::VIDEO | dsi_mode::VIDEO_BURST | dsi_mode::VIDEO_SYNC_PULSE),
);

static LG_LD070WX3_SL01_MODE: [DisplayMode; 1] =
    [mode(71000, (800, 32, 1, 57), (1280, 28, 1, 14), 60, 0)];

/// LG LD070WX3-SL01 7" WXGA.
pub static LG_LD070WX3_SL01: PanelDescriptor = dsi_panel(
    &LG_LD070WX3_SL01_MODE,
    8,
    (94, 151),
    four_lanes(dsi_mode::VIDEO | dsi_mode::CLOCK_NON_CONTINUOUS),
);

static LG_LH500WX1_SD03_MODE: [DisplayMode; 1] =
    [mode(67000, (720, 12, 4, 112), (1280, 8, 4, 12), 60, 0)];

/// LG LH500WX1-SD03 5" HD.
pub static LG_LH500WX1_SD03: PanelDescriptor = dsi_panel(
    &LG_LH500WX1_SD03_MODE,
    8,
    (62, 110),
    four_lanes(dsi_mode::VIDEO),
);

static PANASONIC_VVX10F004B00_MODE: [DisplayMode; 1] =
    [mode(157200, (1920, 154, 16, 32), (1200, 17, 2, 16), 60, 0)];

/// Panasonic VVX10F004B00 10.1" WUXGA.
pub static PANASONIC_VVX10F004B00: PanelDescriptor = dsi_panel(
    &PANASONIC_VVX10F004B00_MODE,
    8,
    (217, 136),
    four_lanes(
        dsi_mode::VIDEO | dsi_mode::VIDEO_SYNC_PULSE | dsi_mode::CLOCK_NON_CONTINUOUS,
    ),
);

pub static DSI_PANELS: &[OfMatch] = &[
    OfMatch::new("auo,b080uan01", &AUO_B080UAN01),
    OfMatch::new("boe,tv080wum-nl0", &BOE_TV080WUM_NL0),
    OfMatch::new("lg,ld070wx3-sl01", &LG_LD070WX3_SL01),
    OfMatch::new("lg,lh500wx1-sd03", &LG_LH500WX1_SD03),
    OfMatch::new("panasonic,vvx10f004b00", &PANASONIC_VVX10F004B00),
];
