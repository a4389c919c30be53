use formguard::config::GibberishThresholds;
use formguard::guard::fingerprint::{fingerprint, hash32, to_base36, ClientProfile};
use formguard::guard::gibberish::{is_gibberish, is_gibberish_with, longest_consonant_run};
use formguard::guard::sanitize::{contains_injection, is_valid_email, sanitize};
use formguard::guard::spam::longest_repeat;

// ── Sanitize ────────────────────────────────────────────────────

#[test]
fn sanitize_escapes_script_tags() {
    let out = sanitize("<script>alert(1)</script>");
    assert!(!out.contains('<'));
    assert!(!out.contains('>'));
    assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt;");
}

#[test]
fn sanitize_encodes_quotes_and_ampersands() {
    assert_eq!(
        sanitize(r#"Tom & "Jerry" 'cat'"#),
        "Tom &amp; &quot;Jerry&quot; &#x27;cat&#x27;"
    );
}

#[test]
fn sanitize_strips_control_characters_but_keeps_layout() {
    assert_eq!(sanitize("  a\u{0}b\r\n\tc\u{1b}  "), "ab\n\tc");
    assert_eq!(sanitize("\u{7f}del"), "\u{7f}del");
}

#[test]
fn sanitize_is_stable_without_special_characters() {
    let once = sanitize("  Plain text\twith a tab\nand a newline ");
    assert_eq!(sanitize(&once), once);
}

#[test]
fn sanitize_reencodes_ampersands() {
    // Single-pass only
    assert_eq!(sanitize(&sanitize("a & b")), "a &amp;amp; b");
}

// ── Injection signatures ────────────────────────────────────────

#[test]
fn injection_signatures_are_detected() {
    let samples = [
        "<script>alert(1)</script>",
        "<SCRIPT type=\"text/javascript\">\nsteal()\n</script >",
        "javascript:alert(1)",
        "JavaScript :void(0)",
        "ONCLICK=steal()",
        "onmouseover = x",
        "<iframe src=//evil.example>",
        "<object data=x>",
        "<EMBED src=x>",
        "<link rel=stylesheet href=x>",
        "data:text/html;base64,PHNjcmlwdD4=",
        "data:,hello",
        "vbscript:msgbox(1)",
        "width: expression(alert(1))",
        "background: url( 'data:image/png;base64,AAAA')",
    ];
    for sample in samples {
        assert!(contains_injection(sample), "{sample:?} should be flagged");
    }
}

#[test]
fn ordinary_prose_is_not_flagged() {
    let samples = [
        "Here is my data: it is all fine",
        "Upon reflection, the conference was great",
        "I'd like a quote for the online course",
        "Use a < b and c > d in the formula",
        "My script for the play is attached",
    ];
    for sample in samples {
        assert!(!contains_injection(sample), "{sample:?} should pass");
    }
}

// ── Email ───────────────────────────────────────────────────────

#[test]
fn valid_emails_pass() {
    for email in [
        "user@example.com",
        "first.last+tag@sub.example.co.uk",
        "o'brien@example.ie",
        "x@localhost",
    ] {
        assert!(is_valid_email(email), "{email} should be valid");
    }
}

#[test]
fn invalid_emails_fail() {
    let long_label = format!("user@{}.com", "a".repeat(64));
    let too_long = format!("{}@b.co", "a".repeat(250));
    for email in [
        "not-an-email",
        "user@",
        "@example.com",
        "user@-example.com",
        "user@example-.com",
        "user@exa mple.com",
        "user@@example.com",
        long_label.as_str(),
        too_long.as_str(),
    ] {
        assert!(!is_valid_email(email), "{email} should be invalid");
    }
}

// ── Gibberish ───────────────────────────────────────────────────

#[test]
fn random_string_is_gibberish() {
    assert!(is_gibberish("teUxkdAfKqxsOc"));
}

#[test]
fn natural_sentence_is_not_gibberish() {
    assert!(!is_gibberish(
        "Hello, I wanted to reach out about your privacy policy."
    ));
    assert!(!is_gibberish("Jane Cooper"));
}

#[test]
fn short_text_is_never_gibberish() {
    assert!(!is_gibberish("xkcdq"));
    assert!(!is_gibberish("qz 12345 678"));
    assert!(!is_gibberish(""));
}

#[test]
fn each_signal_flags_on_its_own() {
    // Vowel ratio
    assert!(is_gibberish("aeiouaeiou"));
    // Consonant run
    assert!(is_gibberish("abcdfgha"));
    // Erratic capitalization
    assert!(is_gibberish("HeLlOwOrLdHeLlO"));
    // No common digraphs
    assert!(is_gibberish("bobobobobobo"));
}

#[test]
fn thresholds_are_configurable() {
    let lenient = GibberishThresholds {
        consonant_run_limit: 10,
        ..GibberishThresholds::default()
    };
    assert!(is_gibberish("abcdfgha"));
    assert!(!is_gibberish_with("abcdfgha", &lenient));
}

#[test]
fn consonant_runs_are_broken_by_non_letters() {
    assert_eq!(longest_consonant_run("strengths"), 5);
    assert_eq!(longest_consonant_run("rhythm"), 6);
    assert_eq!(longest_consonant_run("bcd fgh"), 3);
    assert_eq!(longest_consonant_run(""), 0);
}

#[test]
fn longest_repeat_counts_runs() {
    assert_eq!(longest_repeat("aaab!!!!"), 4);
    assert_eq!(longest_repeat("abc"), 1);
    assert_eq!(longest_repeat(""), 0);
}

// ── Fingerprint ─────────────────────────────────────────────────

#[test]
fn hash_matches_known_values() {
    assert_eq!(hash32("a"), 97);
    assert_eq!(hash32(""), 0);
    assert_eq!(hash32("de-DE|Win32|2560x1440|-120"), -1_957_050_956);
}

#[test]
fn base36_rendering() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(97), "2p");
}

#[test]
fn fingerprint_folds_profile_components() {
    let profile = ClientProfile {
        language: Some("en-US".to_string()),
        platform: Some("MacIntel".to_string()),
        screen_width: Some(1920),
        screen_height: Some(1080),
        timezone_offset: Some(-60),
        timezone: Some("Europe/Berlin".to_string()),
    };
    assert_eq!(fingerprint(&profile), "f409o9");

    // Negative hashes are rendered by absolute value
    let profile = ClientProfile {
        language: Some("de-DE".to_string()),
        platform: Some("Win32".to_string()),
        screen_width: Some(2560),
        screen_height: Some(1440),
        timezone_offset: Some(-120),
        timezone: None,
    };
    assert_eq!(fingerprint(&profile), "wd6e6k");
}

#[test]
fn fingerprint_ignores_timezone_name() {
    let a = ClientProfile {
        timezone: Some("Europe/Paris".to_string()),
        ..ClientProfile::default()
    };
    let b = ClientProfile::default();
    assert_eq!(fingerprint(&a), fingerprint(&b));
}
