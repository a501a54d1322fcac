use crate::descriptor::{
    bus_flags, bus_format, display_flags, mode_flags, DelayProfile, DisplayMode, DisplayTiming,
    PanelDescriptor, TimingEntry,
};
use crate::models::{mode, panel, timed_panel, OfMatch};

const fn delays(prepare: u32, enable: u32, disable: u32, unprepare: u32) -> DelayProfile {
    DelayProfile {
        prepare,
        enable,
        disable,
        unprepare,
        reset: 0,
        init: 0,
    }
}

static AMPIRE_AM_480272H3TMQW_T01H_MODE: [DisplayMode; 1] = [mode(
    9000,
    (480, 2, 41, 2),
    (272, 2, 10, 2),
    60,
    mode_flags::PHSYNC | mode_flags::PVSYNC,
)];

/// Ampire AM-480272H3TMQW-T01H 4.3" WQVGA TFT.
pub static AMPIRE_AM_480272H3TMQW_T01H: PanelDescriptor = panel(
    &AMPIRE_AM_480272H3TMQW_T01H_MODE,
    8,
    (105, 67),
    DelayProfile::NONE,
    bus_format::RGB888_1X24,
    0,
);

static AMPIRE_AM800480R3TMQWA1H_MODE: [DisplayMode; 1] = [mode(
    33333,
    (800, 0, 255, 0),
    (480, 2, 45, 0),
    60,
    mode_flags::PHSYNC | mode_flags::PVSYNC,
)];

/// Ampire AM-800480R3TMQW-A1H 7" WVGA TFT.
pub static AMPIRE_AM800480R3TMQWA1H: PanelDescriptor = panel(
    &AMPIRE_AM800480R3TMQWA1H_MODE,
    6,
    (152, 91),
    DelayProfile::NONE,
    bus_format::RGB666_1X18,
    0,
);

static SANTEK_ST0700I5Y_RBSLW_F_TIMING: [DisplayTiming; 1] = [DisplayTiming {
    pixelclock: TimingEntry::new(26_400_000, 33_300_000, 46_800_000),
    hactive: TimingEntry::fixed(800),
    hfront_porch: TimingEntry::new(16, 210, 354),
    hback_porch: TimingEntry::new(45, 36, 6),
    hsync_len: TimingEntry::new(1, 10, 40),
    vactive: TimingEntry::fixed(480),
    vfront_porch: TimingEntry::new(7, 22, 147),
    vback_porch: TimingEntry::new(22, 13, 3),
    vsync_len: TimingEntry::new(1, 10, 20),
    flags: display_flags::HSYNC_LOW
        | display_flags::VSYNC_LOW
        | display_flags::DE_HIGH
        | display_flags::PIXDATA_POSEDGE,
}];

/// Armadeus ST0700 adapter (Santek ST0700I5Y-RBSLW-F).
pub static ARMADEUS_ST0700_ADAPT: PanelDescriptor = timed_panel(
    &SANTEK_ST0700I5Y_RBSLW_F_TIMING,
    6,
    (154, 86),
    DelayProfile::NONE,
    bus_format::RGB666_1X18,
    bus_flags::DE_HIGH | bus_flags::PIXDATA_POSEDGE,
);

static AUO_B101AW03_MODE: [DisplayMode; 1] =
    [mode(51450, (1024, 156, 8, 156), (600, 16, 6, 16), 60, 0)];

/// AUO B101AW03 10.1" WSVGA.
pub static AUO_B101AW03: PanelDescriptor = panel(
    &AUO_B101AW03_MODE,
    6,
    (223, 125),
    DelayProfile::NONE,
    0,
    0,
);

static AUO_G070VVN01_TIMINGS: [DisplayTiming; 1] = [DisplayTiming {
    pixelclock: TimingEntry::new(33_300_000, 34_209_000, 45_000_000),
    hactive: TimingEntry::fixed(800),
    hfront_porch: TimingEntry::new(20, 40, 200),
    hback_porch: TimingEntry::new(87, 40, 1),
    hsync_len: TimingEntry::new(1, 48, 87),
    vactive: TimingEntry::fixed(480),
    vfront_porch: TimingEntry::new(5, 13, 200),
    vback_porch: TimingEntry::new(31, 31, 29),
    vsync_len: TimingEntry::new(1, 1, 3),
    flags: 0,
}];

/// AUO G070VVN01 7" WVGA.
pub static AUO_G070VVN01: PanelDescriptor = timed_panel(
    &AUO_G070VVN01_TIMINGS,
    8,
    (152, 91),
    delays(200, 50, 50, 1000),
    0,
    0,
);

static BOE_HV070WSA_MODE: [DisplayMode; 1] =
    [mode(40800, (1024, 90, 90, 90), (600, 3, 4, 3), 60, 0)];

/// BOE HV070WSA-100 7" WSVGA.
pub static BOE_HV070WSA: PanelDescriptor = panel(
    &BOE_HV070WSA_MODE,
    0,
    (154, 90),
    DelayProfile::NONE,
    0,
    0,
);

static BOE_NV101WXMN51_MODES: [DisplayMode; 2] = [
    mode(71900, (1280, 48, 32, 80), (800, 3, 5, 24), 60, 0),
    mode(57500, (1280, 48, 32, 80), (800, 3, 5, 24), 48, 0),
];

/// BOE NV101WXMN51 10.1" WXGA, 60 Hz and 48 Hz modes.
pub static BOE_NV101WXMN51: PanelDescriptor = panel(
    &BOE_NV101WXMN51_MODES,
    8,
    (217, 136),
    delays(210, 50, 0, 160),
    0,
    0,
);

static CHUNGHWA_CLAA070WP03XG_MODE: [DisplayMode; 1] = [mode(
    66770,
    (800, 49, 33, 17),
    (1280, 1, 7, 15),
    60,
    mode_flags::NVSYNC | mode_flags::NHSYNC,
)];

/// Chunghwa CLAA070WP03XG 7" WXGA.
pub static CHUNGHWA_CLAA070WP03XG: PanelDescriptor = panel(
    &CHUNGHWA_CLAA070WP03XG_MODE,
    6,
    (94, 150),
    DelayProfile::NONE,
    0,
    0,
);

pub static PLATFORM_PANELS: &[OfMatch] = &[
    OfMatch::new("ampire,am-480272h3tmqw-t01h", &AMPIRE_AM_480272H3TMQW_T01H),
    OfMatch::new("ampire,am800480r3tmqwa1h", &AMPIRE_AM800480R3TMQWA1H),
    OfMatch::new("armadeus,st0700-adapt", &ARMADEUS_ST0700_ADAPT),
    OfMatch::new("auo,b101aw03", &AUO_B101AW03),
    OfMatch::new("auo,g070vvn01", &AUO_G070VVN01),
    OfMatch::new("boe,hv070wsa-100", &BOE_HV070WSA),
    OfMatch::new("boe,nv101wxmn51", &BOE_NV101WXMN51),
    OfMatch::new("chunghwa,claa070wp03xg", &CHUNGHWA_CLAA070WP03XG),
];
