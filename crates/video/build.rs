use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only FFmpeg needs any setup, and only on Windows (elsewhere the system's
    // FFmpeg libraries are found by `ffmpeg-sys-next`).
    if env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
        return;
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "windows" {
        windows();
    }
}

fn windows() {
    // This is needed because we need to copy our FFmpeg DLLs into the target
    // directory so executables (and tests) can link to them at runtime.

    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

    let Ok(ffmpeg_dir) = env::var("FFMPEG_DIR") else {
        println!("cargo:warning=`FFMPEG_DIR` is unset, FFmpeg DLLs won't be copied.");
        return;
    };

    let ffmpeg_bin_dir = Path::new(&ffmpeg_dir).join("bin");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target_dir = out_dir.ancestors().nth(3).unwrap();

    for entry in fs::read_dir(&ffmpeg_bin_dir).unwrap() {
        let entry_path = entry.unwrap().path();

        if entry_path.extension().and_then(|s| s.to_str()) == Some("dll") {
            let dll_file_name = entry_path.file_name().unwrap();

            fs::copy(&entry_path, target_dir.join(dll_file_name)).unwrap();
            fs::copy(&entry_path, target_dir.join("deps").join(dll_file_name)).unwrap();
        }
    }
}
