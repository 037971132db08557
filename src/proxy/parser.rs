//! Listing parser for `host:port` text returned by the listing provider

/// Parser for the provider's plain-text proxy listing
pub struct ListingParser;

impl ListingParser {
    /// Split a single listing line into host and port
    ///
    /// Lines without a colon are treated as blank or malformed. Bracketed
    /// IPv6 hosts (`[::1]:8080`) are accepted; any other extra colon, an
    /// empty host or an empty port rejects the line.
    pub fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.trim();
        if !line.contains(':') {
            return None;
        }

        let (host, port) = if let Some(rest) = line.strip_prefix('[') {
            let (host, port) = rest.split_once("]:")?;
            if host.contains(']') {
                return None;
            }
            (host, port)
        } else {
            let (host, port) = line.rsplit_once(':')?;
            if host.contains(':') || host.contains(']') {
                return None;
            }
            (host, port)
        };

        if host.is_empty() || port.is_empty() || port.contains(':') {
            return None;
        }

        Some((host.to_string(), port.to_string()))
    }

    /// Parse every usable line of a listing body
    pub fn parse_listing(content: &str) -> Vec<(String, String)> {
        content.lines().filter_map(Self::parse_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_line() {
        let (host, port) = ListingParser::parse_line("1.2.3.4:8080").unwrap();
        assert_eq!(host, "1.2.3.4");
        assert_eq!(port, "8080");
    }

    #[test]
    fn test_parse_line_without_colon() {
        assert!(ListingParser::parse_line("not-a-proxy").is_none());
        assert!(ListingParser::parse_line("").is_none());
        assert!(ListingParser::parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_hostname() {
        let (host, port) = ListingParser::parse_line("proxy.example.com:3128").unwrap();
        assert_eq!(host, "proxy.example.com");
        assert_eq!(port, "3128");
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let (host, port) = ListingParser::parse_line("[2001:db8::1]:8080").unwrap();
        assert_eq!(host, "2001:db8::1");
        assert_eq!(port, "8080");
    }

    #[test]
    fn test_parse_malformed_lines() {
        assert!(ListingParser::parse_line(":8080").is_none());
        assert!(ListingParser::parse_line("1.2.3.4:").is_none());
        assert!(ListingParser::parse_line("1.2.3.4:80:80").is_none());
        assert!(ListingParser::parse_line("2001:db8::1").is_none());
        assert!(ListingParser::parse_line("[::1]8080").is_none());
    }

    #[test]
    fn test_parse_listing_crlf() {
        let body = "1.2.3.4:8080\r\n5.6.7.8:3128\r\n\r\ngarbage\r\n9.9.9.9:80";
        let entries = ListingParser::parse_listing(body);
        assert_eq!(
            entries,
            vec![
                ("1.2.3.4".to_string(), "8080".to_string()),
                ("5.6.7.8".to_string(), "3128".to_string()),
                ("9.9.9.9".to_string(), "80".to_string()),
            ]
        );
    }

    #[test]
    fn test_port_kept_as_text() {
        let (_, port) = ListingParser::parse_line("1.2.3.4:08080").unwrap();
        assert_eq!(port, "08080");
    }
}
