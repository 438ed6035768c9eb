/// Property-based fuzz tests for the edit engine's core operations.
///
/// These use `proptest` to generate random inputs and verify invariants
/// that must always hold, regardless of input. Goals:
///   - No panics in any public function given arbitrary input
///   - Output format invariants (hash is always 2 hex chars, etc.)
///   - Round-trip properties (format then strip = original content)
use hashedit::*;
use proptest::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════
// compute_line_hash — no panics, always 2 hex chars
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_hash_always_2_hex_chars(line in ".*", idx in 1usize..100000) {
        let hash = compute_line_hash(idx, &line);
        prop_assert_eq!(hash.len(), 2);
        prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()),
            "hash {:?} contains non-hex chars", hash);
    }

    #[test]
    fn fuzz_hash_deterministic(line in ".*", idx in 1usize..100000) {
        prop_assert_eq!(
            compute_line_hash(idx, &line),
            compute_line_hash(idx, &line)
        );
    }

    #[test]
    fn fuzz_hash_trailing_cr_invariant(line in "[^\r\n]*", idx in 1usize..100000) {
        let with_cr = format!("{}\r", line);
        prop_assert_eq!(
            compute_line_hash(idx, &with_cr),
            compute_line_hash(idx, &line)
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// parse_line_ref / parse_edit_spec — no panics, consistent error/success
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_parse_line_ref_no_panic(s in ".*") {
        // Must not panic — either Ok or Err
        let _ = parse_line_ref(&s);
    }

    #[test]
    fn fuzz_parse_edit_spec_no_panic(s in ".*") {
        let _ = parse_edit_spec(&s);
    }

    #[test]
    fn fuzz_parse_valid_ref_roundtrips(
        line in 1usize..100000,
        content in ".*"
    ) {
        // A properly formatted ref must always parse successfully
        let hash = compute_line_hash(line, &content);
        let ref_str = format!("{}:{}", line, hash);
        let parsed = parse_line_ref(&ref_str);
        prop_assert!(parsed.is_ok(), "failed to parse {:?}: {:?}", ref_str, parsed);
        let r = parsed.unwrap();
        prop_assert_eq!(r.line, line);
        prop_assert_eq!(&r.hash, &hash);
    }

    #[test]
    fn fuzz_parse_valid_ref_is_single_spec(
        line in 1usize..100000,
        content in "[^\n]*"
    ) {
        let hash = compute_line_hash(line, &content);
        let spec = parse_edit_spec(&format!("{}:{}", line, hash));
        prop_assert!(matches!(spec, Ok(EditSpec::Single(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// format_hashlines — no panics, output is parseable
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_format_no_panic(content in ".*", start in 1usize..100000) {
        let _ = format_hashlines(&content, start);
    }

    #[test]
    fn fuzz_format_line_count_matches(
        lines in prop::collection::vec("[^\n]*", 1..20),
        start in 1usize..1000
    ) {
        let content = lines.join("\n");
        let formatted = format_hashlines(&content, start);
        let out_lines: Vec<&str> = formatted.split('\n').collect();
        prop_assert_eq!(out_lines.len(), lines.len());
    }

    #[test]
    fn fuzz_format_line_numbers_are_sequential(
        lines in prop::collection::vec("[^\n]*", 1..20),
        start in 1usize..1000
    ) {
        let content = lines.join("\n");
        let formatted = format_hashlines(&content, start);
        for (i, out) in formatted.split('\n').enumerate() {
            let expected_num = start + i;
            prop_assert!(
                out.starts_with(&format!("{}:", expected_num)),
                "line {} should start with {}:, got {:?}", i, expected_num, out
            );
        }
    }

    #[test]
    fn fuzz_format_strip_prefix_recovers_content(
        lines in prop::collection::vec("[^\n]*", 1..20),
        start in 1usize..1000
    ) {
        // The prefix ends at the first pipe; digits and hex never contain
        // one, so find('|') is always the separator.
        let content = lines.join("\n");
        let formatted = format_hashlines(&content, start);
        let mut recovered = Vec::new();
        for out in formatted.split('\n') {
            let pipe = out.find('|').expect("no pipe separator");
            recovered.push(&out[pipe + 2..]);
        }
        prop_assert_eq!(recovered.join("\n"), content);
    }

    #[test]
    fn fuzz_format_hashes_verify(
        lines in prop::collection::vec("[^\n]*", 1..20),
        start in 1usize..1000
    ) {
        // Every output line's hash must match compute_line_hash of its content
        let content = lines.join("\n");
        let formatted = format_hashlines(&content, start);
        for (i, out) in formatted.split('\n').enumerate() {
            let pipe = out.find('|').expect("no pipe separator");
            let prefix = &out[..pipe];
            let content_part = &out[pipe + 2..];
            let colon = prefix.find(':').expect("no colon");
            let num: usize = prefix[..colon].parse().expect("non-numeric line num");
            let hash = &prefix[colon + 1..];
            prop_assert_eq!(
                compute_line_hash(num, content_part), hash,
                "hash mismatch on line {}", i
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// apply_hashline_edits — no panics on arbitrary input
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_apply_empty_edits_is_noop(content in "[^\x00]*") {
        // Empty edit list must never panic and must return content unchanged
        let result = apply_hashline_edits(&content, &[]);
        prop_assert!(result.is_ok());
        let result = result.unwrap();
        prop_assert_eq!(result.content, content);
        prop_assert_eq!(result.first_changed_line, None);
    }

    #[test]
    fn fuzz_apply_arbitrary_src_no_panic(
        lines in prop::collection::vec("[^\n\x00]*", 1..20),
        src in "[^\n\x00]*",
        dst in "[^\x00]*"
    ) {
        let content = lines.join("\n");
        let edits = vec![Edit { src, dst }];
        // Must not panic regardless of whether it succeeds or fails
        let _ = apply_hashline_edits(&content, &edits);
    }

    #[test]
    fn fuzz_apply_stale_anchor_never_applies(
        lines in prop::collection::vec("[^\n\x00]*", 1..20),
        target_line in 1usize..20,
        new_text in "[^\n\x00]*"
    ) {
        let content = lines.join("\n");
        // A deliberately out-of-alphabet hash never validates, so the edit
        // either errors or (if parsed as substring) cannot touch hashes.
        let src = format!("{}:00", target_line);
        let file_lines: Vec<&str> = content.split('\n').collect();
        let in_range = target_line <= file_lines.len();
        let stale = in_range
            && compute_line_hash(target_line, file_lines[target_line - 1]) != "00";
        let edits = vec![Edit { src, dst: new_text }];
        let result = apply_hashline_edits(&content, &edits);
        if stale {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn fuzz_apply_correct_anchor_succeeds(
        lines in prop::collection::vec("[^\n\x00]*", 1..10),
        target_idx in 0usize..10,
        new_text in "[^\n\x00]*"
    ) {
        let content = lines.join("\n");
        let file_lines: Vec<&str> = content.split('\n').collect();
        let idx = target_idx % file_lines.len();
        let line_num = idx + 1;
        let src = format!("{}:{}", line_num, compute_line_hash(line_num, file_lines[idx]));
        let edits = vec![Edit { src, dst: new_text }];
        let result = apply_hashline_edits(&content, &edits);
        prop_assert!(result.is_ok(), "edit failed: {:?}", result.err());
    }

    #[test]
    fn fuzz_apply_disjoint_singles_order_invariant(
        lines in prop::collection::vec("[a-z]{1,12}", 4..16),
        a_idx in 0usize..16,
        b_idx in 0usize..16
    ) {
        let content = lines.join("\n");
        let file_lines: Vec<&str> = content.split('\n').collect();
        let n = file_lines.len();
        let a = a_idx % n;
        let b = b_idx % n;
        prop_assume!(a != b);

        let mk = |idx: usize, text: &str| Edit {
            src: format!("{}:{}", idx + 1, compute_line_hash(idx + 1, file_lines[idx])),
            dst: text.to_string(),
        };
        let forward = vec![mk(a, "EDIT_A"), mk(b, "EDIT_B")];
        let reversed = vec![mk(b, "EDIT_B"), mk(a, "EDIT_A")];

        let x = apply_hashline_edits(&content, &forward).unwrap();
        let y = apply_hashline_edits(&content, &reversed).unwrap();
        prop_assert_eq!(x.content, y.content);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// find_edit_match — no panics, structured results
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fuzz_match_no_panic(content in "[^\x00]*", old in "[^\x00]*") {
        let _ = find_edit_match(&content, &old, &MatchOptions::default());
    }

    #[test]
    fn fuzz_match_exact_span_is_faithful(
        prefix in "[a-z \n]*",
        needle in "[A-Z]{4,12}",
        suffix in "[a-z \n]*"
    ) {
        // A needle that occurs exactly once must be found verbatim
        let content = format!("{}{}{}", prefix, needle, suffix);
        prop_assume!(content.matches(&needle).count() == 1);
        let result = find_edit_match(&content, &needle, &MatchOptions::default());
        let span = result.span.expect("unique needle must match");
        prop_assert_eq!(
            &content[span.start_index..span.start_index + span.actual_text.len()],
            span.actual_text.as_str()
        );
        prop_assert_eq!(span.actual_text, needle);
    }
}
