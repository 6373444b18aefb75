use std::path::PathBuf;

use xefbview::{FbDims, pack_argb, tiled_pixel_index};

#[test]
fn cli_dump_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let dump_path = dir.join("fbmem.bin");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let dims = FbDims::native(64, 64).unwrap();
    let mut src = vec![0u8; dims.source_len_bytes()];
    for px in src.chunks_exact_mut(4) {
        px.copy_from_slice(&pack_argb(30, 30, 30, 255).to_le_bytes());
    }
    let slot = tiled_pixel_index(dims.tiled_w, (9 * dims.tiled_w + 5) * 4) as usize;
    src[slot * 4..slot * 4 + 4].copy_from_slice(&pack_argb(255, 0, 0, 255).to_le_bytes());
    std::fs::write(&dump_path, &src).unwrap();

    let exe = std::env::var_os("CARGO_BIN_EXE_xefbview")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "xefbview.exe"
            } else {
                "xefbview"
            });
            p
        });

    let input_arg = dump_path.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe)
        .args(["dump", "--input", input_arg.as_str(), "--width", "64", "--height", "64", "--out"])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());

    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 64));
    assert_eq!(img.get_pixel(5, 9).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(0, 0).0, [30, 30, 30, 255]);
    assert_eq!(img.get_pixel(63, 63).0, [30, 30, 30, 255]);
}
