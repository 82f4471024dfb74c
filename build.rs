use std::env;
use std::path::PathBuf;

/// Where a package manager usually puts FFmpeg on this target, if anywhere.
fn ffmpeg_hint(target_os: &str) -> Option<String> {
    match target_os {
        "windows" => {
            let root = env::var("VCPKG_ROOT").ok()?;
            let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".into());
            let candidate = PathBuf::from(root).join("installed").join(triplet);
            if candidate.exists() {
                Some(format!(
                    "found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly",
                    candidate.display()
                ))
            } else {
                Some(format!(
                    "VCPKG_ROOT is set but {} does not exist; run `vcpkg install ffmpeg`",
                    candidate.display()
                ))
            }
        }
        "macos" => {
            let prefix = ["/opt/homebrew/opt/ffmpeg", "/usr/local/opt/ffmpeg"]
                .into_iter()
                .map(PathBuf::from)
                .find(|path| path.exists())?;
            Some(format!(
                "using FFmpeg from pkg-config; Homebrew's copy is at {}",
                prefix.display()
            ))
        }
        _ => None,
    }
}

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match ffmpeg_hint(&target_os) {
        Some(hint) => println!("cargo:warning=vid2gif: {hint}"),
        None if target_os == "windows" => println!(
            "cargo:warning=vid2gif: FFMPEG_DIR is not set; install FFmpeg (e.g. with vcpkg) and point FFMPEG_DIR at it"
        ),
        None => {}
    }
}
