//! Unit tests for the output channel.

use super::*;

#[test]
fn unbuffered_writes_pass_straight_through() {
    let (channel, capture) = OutputChannel::capture();
    channel.write_str("hello").expect("write");
    assert_eq!(capture.text(), "hello");
}

#[test]
fn buffered_writes_are_withheld_until_commit() {
    let (channel, capture) = OutputChannel::capture();
    channel.begin_buffering();
    assert!(channel.is_buffering());

    channel.write_str("bar").expect("write");
    assert_eq!(capture.text(), "", "nothing reaches the sink while buffering");

    let bytes = channel.commit().expect("commit");
    assert_eq!(bytes, b"bar");
    assert_eq!(capture.text(), "bar");
    assert!(!channel.is_buffering());
}

#[test]
fn discard_drops_buffered_bytes() {
    let (channel, capture) = OutputChannel::capture();
    channel.begin_buffering();
    channel.write_str("lost").expect("write");
    channel.discard();

    assert!(!channel.is_buffering());
    assert_eq!(capture.text(), "");

    channel.write_str("kept").expect("write");
    assert_eq!(capture.text(), "kept");
}

#[test]
fn begin_buffering_is_idempotent() {
    let (channel, _capture) = OutputChannel::capture();
    channel.begin_buffering();
    channel.write_str("a").expect("write");
    channel.begin_buffering();
    channel.write_str("b").expect("write");

    assert_eq!(channel.commit().expect("commit"), b"ab");
}

#[test]
fn commit_without_buffer_yields_nothing() {
    let (channel, capture) = OutputChannel::capture();
    assert!(channel.commit().expect("commit").is_empty());
    assert_eq!(capture.text(), "");
}

#[test]
fn clones_share_buffer_state() {
    let (channel, capture) = OutputChannel::capture();
    let clone = channel.clone();
    channel.begin_buffering();
    clone.write_str("shared").expect("write");
    assert_eq!(channel.commit().expect("commit"), b"shared");
    assert_eq!(capture.text(), "shared");
}
