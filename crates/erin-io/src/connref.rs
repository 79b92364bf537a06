//! Parses the `"<tag>:OUT(<port>)"` / `"<tag>:IN(<port>)"` connection
//! endpoint strings used in `network.connections` (§6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub tag: String,
    pub direction: Direction,
    pub port: usize,
}

/// Parses one endpoint string. Returns `None` on malformed syntax; the
/// caller turns that into a diagnostic with the offending table path.
pub fn parse_port_ref(raw: &str) -> Option<PortRef> {
    let (tag, rest) = raw.split_once(':')?;
    let (direction, inner) = if let Some(inner) = rest.strip_prefix("OUT(") {
        (Direction::Out, inner)
    } else if let Some(inner) = rest.strip_prefix("IN(") {
        (Direction::In, inner)
    } else {
        return None;
    };
    let port_str = inner.strip_suffix(')')?;
    let port = port_str.parse::<usize>().ok()?;
    if tag.is_empty() {
        return None;
    }
    Some(PortRef { tag: tag.to_string(), direction, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_out_ref() {
        let r = parse_port_ref("furnace:OUT(0)").unwrap();
        assert_eq!(r.tag, "furnace");
        assert_eq!(r.direction, Direction::Out);
        assert_eq!(r.port, 0);
    }

    #[test]
    fn parses_in_ref_with_nonzero_port() {
        let r = parse_port_ref("mux1:IN(3)").unwrap();
        assert_eq!(r.direction, Direction::In);
        assert_eq!(r.port, 3);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(parse_port_ref("furnace-OUT(0)").is_none());
        assert!(parse_port_ref("furnace:OUT0)").is_none());
        assert!(parse_port_ref(":OUT(0)").is_none());
    }
}
