use gcl::{compile, ErrorKind, GclError, Severity};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Code bytes of a one-segment program at $0200, without header and end marker
fn code(source: &str) -> Vec<u8> {
    init();
    let compiled = compile(&format!("gcl0x {}", source), "test", 0x0200)
        .unwrap_or_else(|e| panic!("{}: {}", source, e));
    let bytes = compiled.bytes;
    assert_eq!(&bytes[..2], &[0x02, 0x00], "{}: header address", source);
    assert_eq!(bytes.last(), Some(&0), "{}: end marker", source);
    let body = bytes[3..bytes.len() - 1].to_vec();
    assert_eq!(bytes[2] as usize, body.len(), "{}: header length", source);
    body
}

fn error(source: &str) -> ErrorKind {
    init();
    match compile(&format!("gcl0x {}", source), "test", 0x0200) {
        Err(GclError::Fatal { kind, .. }) => kind,
        other => panic!("{}: expected a fatal error, got {:?}", source, other),
    }
}

#[test]
fn test_loads() {
    assert_eq!(code("10"), vec![0x59, 10]);
    assert_eq!(code("255"), vec![0x59, 0xff]);
    assert_eq!(code("1000"), vec![0x11, 0xe8, 0x03]);
    assert_eq!(code("-1"), vec![0x11, 0xff, 0xff]);
    assert_eq!(code("$1234"), vec![0x11, 0x34, 0x12]);
    // Wide literals keep their low sixteen bits, however long
    assert_eq!(code("$10000000000001234"), vec![0x11, 0x34, 0x12]);
    assert_eq!(code("18446744073709556276"), vec![0x11, 0x34, 0x12]);
    assert_eq!(code("x"), vec![0x21, 0x30]);
}

#[test]
fn test_variable_forms() {
    assert_eq!(code("x="), vec![0x2b, 0x30]);
    assert_eq!(code("x,"), vec![0x21, 0x30, 0xad]);
    assert_eq!(code("x;"), vec![0x21, 0x30, 0xf6]);
    assert_eq!(code("x."), vec![0xf0, 0x30]);
    assert_eq!(code("x:"), vec![0xf3, 0x30]);
    assert_eq!(code("x!"), vec![0xcf, 0x30]);
    assert_eq!(code("x= y= x"), vec![0x2b, 0x30, 0x2b, 0x32, 0x21, 0x30]);
}

#[test]
fn test_half_word_forms() {
    assert_eq!(code("<x."), vec![0x5e, 0x30]);
    assert_eq!(code(">x."), vec![0x5e, 0x31]);
    assert_eq!(code("<x,"), vec![0x1a, 0x30]);
    assert_eq!(code(">x,"), vec![0x1a, 0x31]);
    assert_eq!(code("<x++"), vec![0x93, 0x30]);
    assert_eq!(code(">x++"), vec![0x93, 0x31]);
}

#[test]
fn test_literal_slots() {
    assert_eq!(code("$20;"), vec![0x21, 0x20]);
    assert_eq!(code("$20:"), vec![0x2b, 0x20]);
    assert_eq!(code("$20."), vec![0x5e, 0x20]);
    assert_eq!(code("$20,"), vec![0x1a, 0x20]);
    assert_eq!(code("<$20++"), vec![0x93, 0x20]);
}

#[test]
fn test_arithmetic_and_logic() {
    assert_eq!(code("10 20+"), vec![0x59, 10, 0xe3, 20]);
    assert_eq!(code("1-"), vec![0xe6, 1]);
    assert_eq!(code("x+ x-"), vec![0x99, 0x30, 0xb8, 0x30]);
    assert_eq!(code("$0f&"), vec![0x82, 0x0f]);
    assert_eq!(code("x&"), vec![0xf8, 0x30]);
    assert_eq!(code("1|"), vec![0x88, 1]);
    assert_eq!(code("x|"), vec![0xfa, 0x30]);
    assert_eq!(code("1^"), vec![0x8c, 1]);
    assert_eq!(code("x^"), vec![0xfc, 0x30]);
    assert_eq!(code("3<<"), vec![0xe9, 0xe9, 0xe9]);
}

#[test]
fn test_stack_frame() {
    assert_eq!(code("4--"), vec![0xdf, 0xfc]);
    assert_eq!(code("4++"), vec![0xdf, 0x04]);
    assert_eq!(code("2%="), vec![0xec, 2]);
    assert_eq!(code("2%"), vec![0xee, 2]);
    assert_eq!(code("push pop ret"), vec![0x75, 0x63, 0xff]);
}

#[test]
fn test_keywords() {
    assert_eq!(code("call"), vec![0xcf, 0x18]);
    assert_eq!(code("peek deek"), vec![0xad, 0xf6]);
    assert_eq!(code("5?"), vec![0x7f, 5]);
}

#[test]
fn test_raw_bytes() {
    assert_eq!(code("$12# #$34"), vec![0x12, 0x34]);
    assert_eq!(code("-1#"), vec![0xff]);
}

#[test]
fn test_system_calls() {
    // 34 cycles fit in 17 ticks, 3 more than the default budget
    assert_eq!(code("34!"), vec![0xb4, 0xfd]);
    assert_eq!(code("$100!"), vec![0xb4, 0x8e]);
    // Within the default budget
    assert_eq!(code("10!"), vec![0xb4, 0x00]);
    assert_eq!(error("$101!"), ErrorKind::OddValue("$101!".to_string()));
}

#[test]
fn test_quoted_data() {
    assert_eq!(code("`Hi`"), vec![b'H', b'i', b' ']);
    assert_eq!(code("`Hi"), vec![b'H', b'i']);
    assert_eq!(code("`"), vec![b' ']);
    assert_eq!(code("`a``b"), vec![b'a', b'`', b'b']);
    assert_eq!(code("`é"), vec![0xc3, 0xa9]);
    assert_eq!(code("`€`"), vec![0xe2, 0x82, 0xac, b' ']);
}

#[test]
fn test_symbol_substitution() {
    assert_eq!(code("\\vLR"), vec![0x59, 0x1a]);
    assert_eq!(code("\\vLR;"), vec![0x21, 0x1a]);
    assert_eq!(
        error("\\nope"),
        ErrorKind::UndefinedSymbol {
            word: "\\nope".to_string(),
            name: "\\nope".to_string(),
        }
    );
}

#[test]
fn test_invalid_words() {
    assert_eq!(error("+"), ErrorKind::InvalidWord("+".to_string()));
    assert_eq!(error("x%"), ErrorKind::InvalidWord("x%".to_string()));
    assert_eq!(error("x<<"), ErrorKind::InvalidWord("x<<".to_string()));
    assert_eq!(error("1@"), ErrorKind::InvalidWord("1@".to_string()));
}

#[test]
fn test_out_of_range() {
    assert_eq!(error("1000+"), ErrorKind::ValueOutOfRange(1000));
    assert_eq!(error("300."), ErrorKind::IndexOutOfRange(300));
}

#[test]
fn test_deprecated_spellings_warn() {
    init();
    let compiled = compile("gcl0x x<++ x>++ $30=", "test", 0x0200).unwrap();
    assert_eq!(
        &compiled.bytes[3..compiled.bytes.len() - 1],
        &[0x93, 0x30, 0x93, 0x31, 0x2b, 0x30]
    );
    assert_eq!(compiled.warnings.len(), 3);
    assert!(compiled
        .warnings
        .iter()
        .all(|w| w.severity == Severity::Warning && w.line == 1));
    assert!(compiled.warnings[0].message.contains("<x++"));
    assert!(compiled.warnings[1].message.contains(">x++"));
}

#[test]
fn test_version_required() {
    init();
    let err = compile("10 20+", "test", 0x0200).unwrap_err();
    assert_eq!(err.kind(), Some(&ErrorKind::InvalidVersion("10".to_string())));
}
