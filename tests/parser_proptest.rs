use httpfromtcp::http::{Headers, ParseError, ParseResult, Request};
use proptest::prelude::*;

fn method_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z]{1,8}").expect("valid method regex")
}

fn target_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("/[a-z0-9/._-]{0,24}").expect("valid target regex")
}

fn header_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    let name = proptest::string::string_regex("[A-Za-z][A-Za-z0-9-]{0,11}")
        .expect("valid field name regex");
    let value =
        proptest::string::string_regex("[ \t]{0,2}[!-~]{0,16}[ \t]{0,2}").expect("valid value regex");
    proptest::collection::vec((name, value), 0..8)
}

fn render(method: &str, target: &str, headers: &[(String, String)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("{method} {target} HTTP/1.1\r\n").into_bytes();
    for (name, value) in headers {
        raw.extend_from_slice(format!("{name}:{value}\r\n").as_bytes());
    }
    if !body.is_empty() {
        raw.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    }
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(body);
    raw
}

/// Feed `raw` to the parser, delivering it in pieces cut at `cuts`.
///
/// Unconsumed bytes are presented again with the next piece, the way a
/// connection's read buffer would.
fn feed(raw: &[u8], cuts: &[usize]) -> ParseResult<Request> {
    let mut points: Vec<usize> = cuts.iter().map(|cut| cut % (raw.len() + 1)).collect();
    points.push(raw.len());
    points.sort_unstable();

    let mut request = Request::new();
    let mut buffer = Vec::new();
    let mut delivered = 0;
    for point in points {
        if request.is_done() {
            break;
        }
        buffer.extend_from_slice(&raw[delivered..point]);
        delivered = point;

        let consumed = request.parse(&buffer)?;
        buffer.drain(..consumed);
    }
    Ok(request)
}

fn expected_headers(headers: &[(String, String)], body: &[u8]) -> Headers {
    let mut expected = Headers::new();
    for (name, value) in headers {
        expected.set(name, value.trim_matches(|c| c == ' ' || c == '\t'));
    }
    if !body.is_empty() {
        expected.set("Content-Length", &body.len().to_string());
    }
    expected
}

fn pairs(headers: &Headers) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

proptest! {
    #[test]
    fn parse_is_independent_of_read_boundaries(
        method in method_strategy(),
        target in target_strategy(),
        headers in header_strategy(),
        body in proptest::collection::vec(any::<u8>(), 0..64),
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
    ) {
        let raw = render(&method, &target, &headers, &body);
        let request = feed(&raw, &cuts).expect("well-formed request should parse");

        prop_assert!(request.is_done());
        prop_assert_eq!(request.method(), method.as_str());
        prop_assert_eq!(request.target(), target.as_str());
        prop_assert_eq!(request.request_line().version.as_str(), "1.1");
        prop_assert_eq!(pairs(request.headers()), pairs(&expected_headers(&headers, &body)));
        prop_assert_eq!(request.body(), body.as_slice());
    }

    #[test]
    fn one_byte_at_a_time_matches_one_shot(
        method in method_strategy(),
        target in target_strategy(),
        headers in header_strategy(),
    ) {
        let raw = render(&method, &target, &headers, b"");
        let one_shot = feed(&raw, &[]).expect("well-formed request should parse");
        let cuts: Vec<usize> = (1..raw.len()).collect();
        let trickled = feed(&raw, &cuts).expect("well-formed request should parse");

        prop_assert_eq!(one_shot.method(), trickled.method());
        prop_assert_eq!(one_shot.target(), trickled.target());
        prop_assert_eq!(pairs(one_shot.headers()), pairs(trickled.headers()));
    }

    #[test]
    fn lowercase_method_is_rejected_at_any_split(
        method in proptest::string::string_regex("[a-z][A-Za-z]{0,6}").expect("valid regex"),
        target in target_strategy(),
        cuts in proptest::collection::vec(any::<usize>(), 0..6),
    ) {
        let raw = render(&method, &target, &[], b"");
        let error = feed(&raw, &cuts).expect_err("lowercase method must be rejected");
        prop_assert!(matches!(error, ParseError::InvalidMethod(_)), "{:?}", error);
    }

    #[test]
    fn excess_body_is_rejected(
        body in proptest::collection::vec(any::<u8>(), 1..32),
        extra in proptest::collection::vec(any::<u8>(), 1..8),
    ) {
        let mut raw = render("POST", "/", &[], &body);
        raw.extend_from_slice(&extra);
        let error = feed(&raw, &[]).expect_err("bytes beyond Content-Length must be rejected");
        let is_excess = matches!(
            error,
            ParseError::ExcessBodyData { expected, received }
                if expected == body.len() && received == body.len() + extra.len()
        );
        prop_assert!(is_excess, "{:?}", error);
    }
}
