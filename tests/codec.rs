use iconvg_rs::{
    Color, DecodeOptions, Encoder, GradientSpread, GradientStop, IconVgError, Metadata, Rectangle,
    Rgba, decode, decode_metadata, disassemble,
};

/// The production "action/info" icon from the Material Design icon set.
fn encode_action_info(e: &mut Encoder) {
    e.reset(Metadata {
        view_box: Rectangle::new(-24.0, -24.0, 24.0, 24.0),
        ..Metadata::default()
    });

    e.start_path(0, 0.0, -20.0);
    e.abs_cube_to(-11.05, -20.0, -20.0, -11.05, -20.0, 0.0);
    e.rel_smooth_cube_to(8.95, 20.0, 20.0, 20.0);
    e.rel_smooth_cube_to(20.0, -8.95, 20.0, -20.0);
    e.abs_smooth_cube_to(11.05, -20.0, 0.0, -20.0);
    e.close_path_rel_move_to(2.0, 30.0);
    e.rel_h_line_to(-4.0);
    e.abs_v_line_to(-2.0);
    e.rel_h_line_to(4.0);
    e.rel_v_line_to(12.0);
    e.close_path_rel_move_to(0.0, -16.0);
    e.rel_h_line_to(-4.0);
    e.rel_v_line_to(-4.0);
    e.rel_h_line_to(4.0);
    e.rel_v_line_to(4.0);
    e.close_path_end_path();
}

const ACTION_INFO_HIRES: [u8; 73] = [
    0x89, 0x49, 0x56, 0x47, 0x02, 0x0a, 0x00, 0x50, 0x50, 0xb0, 0xb0, 0xc0, 0x80, 0x58, 0xa0,
    0xcf, 0xcc, 0x30, 0xc1, 0x58, 0x58, 0xcf, 0xcc, 0x30, 0xc1, 0x58, 0x80, 0x91, 0x37, 0x33,
    0x0f, 0x41, 0xa8, 0xa8, 0xa8, 0xa8, 0x37, 0x33, 0x0f, 0xc1, 0xa8, 0x58, 0x80, 0xcf, 0xcc,
    0x30, 0x41, 0x58, 0x80, 0x58, 0xe3, 0x84, 0xbc, 0xe7, 0x78, 0xe8, 0x7c, 0xe7, 0x88, 0xe9,
    0x98, 0xe3, 0x80, 0x60, 0xe7, 0x78, 0xe9, 0x78, 0xe7, 0x88, 0xe9, 0x88, 0xe1,
];

const ACTION_INFO_LORES: [u8; 63] = [
    0x89, 0x49, 0x56, 0x47, 0x02, 0x0a, 0x00, 0x50, 0x50, 0xb0, 0xb0, 0xc0, 0x80, 0x58, 0xa0,
    0xf5, 0x74, 0x58, 0x58, 0xf5, 0x74, 0x58, 0x80, 0x91, 0xf5, 0x88, 0xa8, 0xa8, 0xa8, 0xa8,
    0x0d, 0x77, 0xa8, 0x58, 0x80, 0x0d, 0x8b, 0x58, 0x80, 0x58, 0xe3, 0x84, 0xbc, 0xe7, 0x78,
    0xe8, 0x7c, 0xe7, 0x88, 0xe9, 0x98, 0xe3, 0x80, 0x60, 0xe7, 0x78, 0xe9, 0x78, 0xe7, 0x88,
    0xe9, 0x88, 0xe1,
];

#[test]
fn encode_action_info_hires() {
    let mut e = Encoder::new();
    e.high_resolution_coordinates = true;
    // Setting the flag before reset must survive it.
    encode_action_info(&mut e);
    assert_eq!(e.bytes().unwrap(), &ACTION_INFO_HIRES[..]);
}

#[test]
fn encode_action_info_lores() {
    let mut e = Encoder::new();
    encode_action_info(&mut e);
    assert_eq!(e.bytes().unwrap(), &ACTION_INFO_LORES[..]);
}

#[test]
fn action_info_metadata() {
    let m = decode_metadata(&ACTION_INFO_HIRES).unwrap();
    assert_eq!(m.view_box, Rectangle::new(-24.0, -24.0, 24.0, 24.0));
}

fn assert_round_trips(bytes: &[u8], high_resolution: bool) {
    let mut replay = Encoder::new();
    replay.high_resolution_coordinates = high_resolution;
    decode(&mut replay, bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(replay.bytes().unwrap(), bytes);
}

#[test]
fn action_info_round_trips() {
    assert_round_trips(&ACTION_INFO_LORES, false);
    assert_round_trips(&ACTION_INFO_HIRES, true);
}

#[test]
fn blank_graphic_round_trips() {
    let mut e = Encoder::new();
    let bytes = e.bytes().unwrap().to_vec();
    assert_eq!(bytes, [0x89, 0x49, 0x56, 0x47, 0x00]);
    assert_round_trips(&bytes, false);
}

#[test]
fn gradient_graphic_round_trips() {
    let rgb = [
        GradientStop {
            offset: 0.0,
            color: Rgba::new(0xff, 0x00, 0x00, 0xff),
        },
        GradientStop {
            offset: 0.25,
            color: Rgba::new(0x00, 0xff, 0x00, 0xff),
        },
        GradientStop {
            offset: 0.5,
            color: Rgba::new(0x00, 0x00, 0xff, 0xff),
        },
        GradientStop {
            offset: 1.0,
            color: Rgba::new(0x00, 0x00, 0x00, 0xff),
        },
    ];

    let mut e = Encoder::new();
    e.set_linear_gradient(10, 10, -12.0, -30.0, 12.0, -18.0, GradientSpread::None, &rgb);
    e.start_path(0, -30.0, -30.0);
    e.abs_h_line_to(30.0);
    e.abs_v_line_to(-18.0);
    e.abs_h_line_to(-30.0);
    e.close_path_end_path();

    e.set_circular_gradient(10, 10, -8.0, 8.0, 0.0, 16.0, GradientSpread::Reflect, &rgb);
    e.start_path(0, -30.0, 2.0);
    e.abs_h_line_to(30.0);
    e.abs_v_line_to(14.0);
    e.abs_h_line_to(-30.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);
}

#[test]
fn elliptical_gradient_round_trips() {
    let stops = [
        GradientStop {
            offset: 0.0,
            color: Rgba::new(0xc0, 0x00, 0x00, 0xff),
        },
        GradientStop {
            offset: 1.0,
            color: Rgba::new(0x00, 0x00, 0xc0, 0xff),
        },
    ];

    let mut e = Encoder::new();
    e.set_elliptical_gradient(
        10,
        10,
        -20.0,
        -10.0,
        0.0,
        24.0,
        30.0,
        15.0,
        GradientSpread::Reflect,
        &stops,
    );
    e.start_path(0, -32.0, -32.0);
    e.abs_h_line_to(32.0);
    e.abs_v_line_to(32.0);
    e.abs_h_line_to(-32.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);
}

#[test]
fn arcs_graphic_round_trips() {
    let mut e = Encoder::new();
    e.set_creg(1, false, Color::Rgba(Rgba::new(0xff, 0x00, 0x00, 0xff)));
    e.set_creg(2, false, Color::Rgba(Rgba::new(0xff, 0xff, 0x00, 0xff)));

    e.start_path(1, -10.0, 0.0);
    e.rel_h_line_to(-15.0);
    e.rel_arc_to(15.0, 15.0, 0.0, true, false, 15.0, -15.0);
    e.close_path_end_path();

    const THIRTY_DEGREES: f32 = 30.0 / 360.0;
    e.start_path(2, -14.0, -4.0);
    e.rel_v_line_to(-15.0);
    e.rel_arc_to(15.0, 15.0, -THIRTY_DEGREES, false, true, -15.0, 15.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);
}

#[test]
fn lod_graphic_round_trips() {
    let mut e = Encoder::new();
    e.start_path(0, -28.0, -20.0);
    e.abs_v_line_to(-28.0);
    e.abs_h_line_to(-20.0);
    e.close_path_end_path();

    e.set_lod(0.0, 80.0);
    e.start_path(0, 28.0, 0.0);
    e.abs_line_to(-14.0, 24.0);
    e.abs_line_to(-14.0, -24.0);
    e.close_path_end_path();

    e.set_lod(80.0, f32::INFINITY);
    e.start_path(0, 28.0, 20.0);
    e.abs_v_line_to(28.0);
    e.abs_h_line_to(20.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);
}

#[test]
fn suggested_palette_round_trips() {
    let mut palette = [Rgba::OPAQUE_BLACK; 64];
    palette[0] = Rgba::new(0x76, 0xe1, 0xfe, 0xff);
    palette[1] = Rgba::new(0x38, 0x4e, 0x54, 0xff);

    let mut e = Encoder::new();
    e.reset(Metadata {
        view_box: Rectangle::new(-24.0, -24.0, 24.0, 24.0),
        palette,
    });
    e.set_creg(0, false, Color::PaletteIndex(1));
    e.start_path(0, -24.0, -24.0);
    e.abs_h_line_to(24.0);
    e.abs_v_line_to(24.0);
    e.abs_h_line_to(-24.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);

    let m = decode_metadata(&bytes).unwrap();
    assert_eq!(m.palette, palette);
}

#[test]
fn reserved_opcodes_are_rejected() {
    // 0xc8 is reserved in styling mode.
    let bad = [0x89, 0x49, 0x56, 0x47, 0x00, 0xc8];
    let mut e = Encoder::new();
    assert_eq!(
        decode(&mut e, &bad, &DecodeOptions::default()),
        Err(IconVgError::ReservedOpcode {
            opcode: 0xc8,
            offset: 5
        })
    );

    // 0xe0 is reserved in drawing mode.
    let bad = [0x89, 0x49, 0x56, 0x47, 0x00, 0xc0, 0x80, 0x80, 0xe0];
    let mut e = Encoder::new();
    assert_eq!(
        decode(&mut e, &bad, &DecodeOptions::default()),
        Err(IconVgError::ReservedOpcode {
            opcode: 0xe0,
            offset: 8
        })
    );
}

#[test]
fn truncated_operands_are_rejected() {
    // A start-path opcode whose second coordinate is missing.
    let bad = [0x89, 0x49, 0x56, 0x47, 0x00, 0xc0, 0x80];
    let mut e = Encoder::new();
    assert_eq!(
        decode(&mut e, &bad, &DecodeOptions::default()),
        Err(IconVgError::InvalidNumber(7))
    );
}

#[test]
fn disassembly_of_a_small_graphic() {
    let mut e = Encoder::new();
    e.set_csel(2);
    e.set_creg(0, false, Color::Rgba(Rgba::new(0xff, 0xff, 0xff, 0xff)));
    e.start_path(0, -4.0, -4.0);
    e.abs_line_to(4.0, -4.0);
    e.abs_line_to(4.0, 4.0);
    e.close_path_end_path();
    let bytes = e.bytes().unwrap().to_vec();

    let want = "\
89 49 56 47   IconVG Magic identifier
00            Number of metadata chunks: 0
02            Set CSEL = 2
80            Set CREG[CSEL-0] to a 1 byte color
7c            RGBA ffffffff
c0            Start path, filled with CREG[CSEL-0]; M (absolute moveTo)
78            -4
78            -4
01            L (absolute lineTo), 2 reps
88            +4
78            -4
              L (absolute lineTo), implicit
88            +4
88            +4
e1            z (closePath); end path
";
    assert_eq!(disassemble(&bytes).unwrap(), want);
}

#[test]
fn disassembly_of_action_info_metadata() {
    let text = disassemble(&ACTION_INFO_HIRES).unwrap();
    assert!(text.starts_with(
        "\
89 49 56 47   IconVG Magic identifier
02            Number of metadata chunks: 1
0a            Metadata chunk length: 5
00            Metadata Identifier: 0 (viewBox)
50            -24
50            -24
b0            +24
b0            +24
c0            Start path, filled with CREG[CSEL-0]; M (absolute moveTo)
"
    ));
    assert!(text.ends_with("e1            z (closePath); end path\n"));
}

#[test]
fn destination_setters_round_trip_through_registers() {
    // Styling ops that exercise every register opcode family.
    let mut e = Encoder::new();
    e.set_csel(5);
    e.set_nsel(6);
    e.set_creg(2, false, Color::Rgba(Rgba::new(0x33, 0x88, 0x00, 0xff)));
    e.set_creg(0, true, Color::Rgba(Rgba::new(0x30, 0x66, 0x07, 0xff)));
    e.set_creg(0, false, Color::Rgba(Rgba::new(0x30, 0x66, 0x07, 0x80)));
    e.set_creg(
        1,
        false,
        Color::Blend {
            t: 0x40,
            c0: 0x7f,
            c1: 0x82,
        },
    );
    e.set_nreg(0, false, 20.0);
    e.set_nreg(3, false, -7.5);
    e.set_nreg(0, true, 0.25);
    e.set_lod(0.0, 80.0);
    e.start_path(0, 0.0, 0.0);
    e.close_path_end_path();

    let bytes = e.bytes().unwrap().to_vec();
    assert_round_trips(&bytes, false);
}
