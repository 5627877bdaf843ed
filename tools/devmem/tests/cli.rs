use std::process::{Command, Output};

fn run(bin: &str, backend: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("PHYSMEM_BACKEND", backend)
        .env("PHYSMEM_DEVICE", "/nonexistent/physmem-test-device")
        .env("PHYSMEM_LOG", "off")
        .output()
        .expect("spawn tool")
}

fn devmem(backend: &str, args: &[&str]) -> Output {
    run(env!("CARGO_BIN_EXE_devmem"), backend, args)
}

fn memtest(backend: &str, args: &[&str]) -> Output {
    run(env!("CARGO_BIN_EXE_memtest"), backend, args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn no_arguments_prints_usage() {
    let output = devmem("fake", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Usage:"), "{}", stderr(&output));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_width_exits_before_mapping() {
    let output = devmem("devmem", &["0x100", "x"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Illegal data type 'x'."));
    assert!(output.stdout.is_empty());
}

#[test]
fn fake_write_reads_back() {
    let output = devmem("fake", &["0x100", "w", "0xdeadbeef"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.starts_with("TEST mode: use fake memory\n"), "{text}");
    assert!(text.contains("Value at address 0x100 ("), "{text}");
    assert!(text.contains("Written 0xdeadbeef; readback 0xdeadbeef\n"), "{text}");
}

#[test]
fn unaligned_half_word_read() {
    let output = devmem("fake", &["0x101", "h"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("Value at address 0x101 ("));
}

#[test]
fn word_write_at_four_byte_offset() {
    let output = devmem("fake", &["0x104", "w", "0xdeadbeef"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Value at address 0x104 ("), "{text}");
    assert!(text.contains("Written 0xdeadbeef; readback 0xdeadbeef\n"), "{text}");
}

#[test]
fn access_past_page_end_is_fatal() {
    let output = devmem("fake", &["0xfff", "w"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("exceeds the mapped page"), "{}", stderr(&output));
}

#[test]
fn fake_multi_word_write() {
    let output = devmem("fake", &["0x0", "w", "0x10", "20"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Readback of 20 words: 0 mismatches"));
}

#[test]
fn fake_cache_line_write() {
    let output = devmem("fake", &["0x40", "c", "0xabcd"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Written "), "{text}");
    assert!(!text.contains(", mismatch"), "{text}");
}

#[test]
fn count_needs_word_width() {
    let output = devmem("fake", &["0x0", "b", "0x10", "4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_device_is_fatal() {
    let output = devmem("devmem", &["0x100"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error at line "), "{}", stderr(&output));
}

#[test]
fn memtest_fill_verifies_page() {
    let output = memtest("fake", &["0x1000", "0", "5"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("run fill-4k..."), "{text}");
    assert!(text.contains("start fill 1000\nwrite off 0\n"), "{text}");
    assert!(text.contains("verify 4096 done"), "{text}");
    assert!(!stderr(&output).contains("fail at"));
}

#[test]
fn memtest_dump_prints_every_row() {
    let output = memtest("fake", &["0x1000", "1"]);
    assert_eq!(output.status.code(), Some(0));
    let rows = stdout(&output).lines().filter(|l| l.contains(": 0x")).count();
    assert_eq!(rows, 256);
}

#[test]
fn memtest_unknown_test() {
    let output = memtest("fake", &["0x1000", "9"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no such test 9"));
}
