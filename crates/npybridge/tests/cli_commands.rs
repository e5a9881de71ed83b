#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use npybridge::format::{encode, read_npy, write_npy, NdArray};
use npybridge::session::escape_literal;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "npybridge-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn npybridge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_npybridge"))
        .args(["--log-level", "error"])
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("npybridge should run")
}

fn int32_grid() -> NdArray {
    NdArray::from_vec(vec![3, 4], (0..12).collect::<Vec<i32>>()).expect("valid grid")
}

#[test]
fn inspect_reports_header_as_json() {
    let dir = unique_temp_dir("inspect");
    let path = dir.join("grid.npy");
    write_npy(&path, &int32_grid()).expect("npy file should be writable");

    let output = npybridge(&["inspect", path.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(summary["descr"], "<i4");
    assert_eq!(summary["element_type"], "int32");
    assert_eq!(summary["shape"], serde_json::json!([3, 4]));
    assert_eq!(summary["header_bytes"], 80);
    assert_eq!(summary["payload_bytes"], 48);
    assert_eq!(summary["available_bytes"], 48);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_flags_truncated_payload() {
    let dir = unique_temp_dir("inspect-truncated");
    let path = dir.join("short.npy");
    let frame = encode(&int32_grid()).expect("grid should encode");
    std::fs::write(&path, &frame[..frame.len() - 5]).expect("file should be writable");

    let output = npybridge(&["inspect", path.to_str().unwrap(), "--format", "pretty"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stdout).contains("truncated"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_rejects_non_npy_file() {
    let dir = unique_temp_dir("inspect-bad");
    let path = dir.join("notes.txt");
    std::fs::write(&path, "just some text\n").expect("file should be writable");

    let output = npybridge(&["inspect", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("magic"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_missing_file_is_not_found() {
    let output = npybridge(&["inspect", "/nonexistent/npybridge/missing.npy"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn escape_prints_hex_literal() {
    let dir = unique_temp_dir("escape");
    let path = dir.join("grid.npy");
    write_npy(&path, &int32_grid()).expect("npy file should be writable");
    let bytes = std::fs::read(&path).expect("npy file should be readable");

    let output = npybridge(&["escape", path.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    assert_eq!(stdout.trim_end(), escape_literal(&bytes));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn escape_with_name_prints_assignment_commands() {
    let dir = unique_temp_dir("escape-name");
    let path = dir.join("grid.npy");
    write_npy(&path, &int32_grid()).expect("npy file should be writable");

    let output = npybridge(&["escape", path.to_str().unwrap(), "--name", "x"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("content = b\"\\x93\\x4E\\x55\\x4D\\x50\\x59"));
    assert_eq!(lines[1], "x = np.load(io.BytesIO(content))");

    let bad = npybridge(&["escape", path.to_str().unwrap(), "--name", "1x"]);
    assert_eq!(bad.status.code(), Some(64));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn demux_splits_transcript_into_text_and_frames() {
    let dir = unique_temp_dir("demux");
    let out_dir = dir.join("frames");
    let first = int32_grid();
    let second = NdArray::from_vec(vec![2, 2], vec![1.0f64, 2.0, 3.0, 4.0]).expect("valid array");

    let transcript = dir.join("session.txt");
    std::fs::write(
        &transcript,
        format!(
            "array([[10, 11, 12, 13],\n{}\nhello\n{}\n",
            escape_literal(&encode(&first).expect("encode")),
            escape_literal(&encode(&second).expect("encode")),
        ),
    )
    .expect("transcript should be writable");

    let output = npybridge(&[
        "demux",
        transcript.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    assert_eq!(stdout, "array([[10, 11, 12, 13],\nhello\n");

    assert_eq!(read_npy(out_dir.join("frame-0.npy")).expect("frame 0"), first);
    assert_eq!(read_npy(out_dir.join("frame-1.npy")).expect("frame 1"), second);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"frames\":2"));
    assert!(stderr.contains("\"text_lines\":2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn demux_reports_undecodable_frames() {
    let dir = unique_temp_dir("demux-bad");
    let out_dir = dir.join("frames");
    let transcript = dir.join("session.txt");
    // Frame prefix without a complete preamble: routed as a frame, rejected on decode.
    std::fs::write(&transcript, "b'\\x93NUMPY\\x01\\x00\\xff'\n").expect("writable");

    let output = npybridge(&[
        "demux",
        transcript.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert!(!out_dir.join("frame-0.npy").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = npybridge(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("npybridge {}", env!("CARGO_PKG_VERSION"))
    );

    let extended = npybridge(&["version", "--extended"]);
    let stdout = String::from_utf8_lossy(&extended.stdout);
    assert!(stdout.contains("npy_format: 1.0"));
    assert!(stdout.contains("cli=true"));
}
