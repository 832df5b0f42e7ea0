//! Line codec for the camera config file.
//!
//! ```text
//! <ip> <username> <password> <channel> [<W>*<H>] [<polygon>]...
//! <polygon> ::= '[' <point> (' ' <point>)* ']'
//! <point>   ::= <int> ',' <int>
//! ```

use crate::config::CameraRecord;
use crate::error::{MaskError, MaskResult};
use crate::mask::{NativePoint, Polygon, Resolution};

/// Parses one config line.
///
/// Blank lines, `#` comments and rows with fewer than four fields yield
/// `Ok(None)`. Errors are scoped to this line.
pub fn parse_line(line: &str) -> MaskResult<Option<CameraRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Ok(None);
    }

    let (resolution, polygon_parts) = match parts.get(4) {
        Some(token) if token.contains('*') => (token.parse::<Resolution>()?, &parts[5..]),
        _ => (Resolution::default(), &parts[4..]),
    };

    let polygons = parse_polygons(&polygon_parts.join(" "))?;

    Ok(Some(CameraRecord {
        ip: parts[0].to_string(),
        username: parts[1].to_string(),
        password: parts[2].to_string(),
        channel: parts[3].to_string(),
        resolution,
        polygons,
    }))
}

/// Scans `[x,y x,y ...]` groups left to right.
///
/// Scanning stops without error at the first structural problem: an unclosed
/// `[`, a `[` nested inside a group, or anything other than whitespace where
/// the next group should open. Whatever follows is dropped. Groups with fewer
/// than three points are skipped. A malformed point fails the whole call.
pub fn parse_polygons(s: &str) -> MaskResult<Vec<Polygon>> {
    let mut polygons = Vec::new();
    let mut rest = s.trim_start();

    while let Some(body) = rest.strip_prefix('[') {
        let Some(end) = body.find(']') else {
            break;
        };
        let inner = &body[..end];
        if inner.contains('[') {
            break;
        }

        let points = inner
            .split_whitespace()
            .map(parse_point)
            .collect::<MaskResult<Vec<_>>>()?;
        if let Some(polygon) = Polygon::new(points) {
            polygons.push(polygon);
        }

        rest = body[end + 1..].trim_start();
    }

    if !rest.is_empty() {
        tracing::debug!("Polygon scan stopped before: {:?}", rest);
    }

    Ok(polygons)
}

fn parse_point(token: &str) -> MaskResult<NativePoint> {
    let invalid = || MaskError::PolygonParse {
        token: token.to_string(),
    };
    let (x, y) = token.split_once(',').ok_or_else(invalid)?;
    let x = x.parse::<i32>().map_err(|_| invalid())?;
    let y = y.parse::<i32>().map_err(|_| invalid())?;
    Ok(NativePoint { x, y })
}

/// Renders a record as a config line (no trailing newline). The resolution is
/// always written.
pub fn serialize_record(record: &CameraRecord) -> String {
    let mut parts = vec![
        record.ip.clone(),
        record.username.clone(),
        record.password.clone(),
        record.channel.clone(),
        record.resolution.to_string(),
    ];

    for polygon in &record.polygons {
        let points: Vec<String> = polygon
            .points()
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect();
        parts.push(format!("[{}]", points.join(" ")));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(points: &[(i32, i32)]) -> Polygon {
        Polygon::new(points.iter().map(|&(x, y)| NativePoint::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn test_parse_full_line() {
        let line = "192.168.1.103 admin pass123 1 1920*1080 [100,100 200,100 200,200 100,200]";
        let record = parse_line(line).unwrap().unwrap();

        assert_eq!(record.ip, "192.168.1.103");
        assert_eq!(record.username, "admin");
        assert_eq!(record.password, "pass123");
        assert_eq!(record.channel, "1");
        assert_eq!(record.resolution, Resolution::new(1920, 1080));
        assert_eq!(
            record.polygons,
            vec![poly(&[(100, 100), (200, 100), (200, 200), (100, 200)])]
        );
    }

    #[test]
    fn test_parse_defaults_resolution() {
        let record = parse_line("10.0.0.5 user pw 2").unwrap().unwrap();
        assert_eq!(record.resolution, Resolution::default());
        assert!(record.polygons.is_empty());

        // Token 4 without '*' opens the polygon region
        let record = parse_line("10.0.0.5 user pw 2 [0,0 10,0 10,10]")
            .unwrap()
            .unwrap();
        assert_eq!(record.resolution, Resolution::new(1920, 1080));
        assert_eq!(record.polygons, vec![poly(&[(0, 0), (10, 0), (10, 10)])]);
    }

    #[test]
    fn test_parse_skips_non_records() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   \t ").unwrap().is_none());
        assert!(parse_line("# comment").unwrap().is_none());
        assert!(parse_line("   # indented comment").unwrap().is_none());
        assert!(parse_line("only two tokens").unwrap().is_none());
    }

    #[test]
    fn test_channel_is_not_validated_at_parse_time() {
        let record = parse_line("10.0.0.5 user pw zero").unwrap().unwrap();
        assert_eq!(record.channel, "zero");
        assert!(record.stream_address().is_err());
    }

    #[test]
    fn test_bad_resolution_fails_line() {
        let err = parse_line("10.0.0.5 user pw 1 1920*abc").unwrap_err();
        assert!(matches!(err, MaskError::ConfigParse { .. }));
    }

    #[test]
    fn test_short_groups_are_dropped() {
        let polygons = parse_polygons("[1,1 2,2] [] [0,0 5,0 5,5]").unwrap();
        assert_eq!(polygons, vec![poly(&[(0, 0), (5, 0), (5, 5)])]);
    }

    #[test]
    fn test_malformed_point_fails() {
        for s in ["[1,1 2,2 x,3]", "[1,1 2 3,3]", "[1,1 2,2,2 3,3]", "[1, 1 2,2 3,3]"] {
            let err = parse_polygons(s).unwrap_err();
            assert!(matches!(err, MaskError::PolygonParse { .. }), "{}", s);
        }
    }

    #[test]
    fn test_scan_stops_at_malformation() {
        let polygons = parse_polygons("[1,1 2,2 3,3] garbage [4,4 5,5 6,6]").unwrap();
        assert_eq!(polygons, vec![poly(&[(1, 1), (2, 2), (3, 3)])]);

        // Unclosed group
        let polygons = parse_polygons("[1,1 2,2 3,3] [4,4 5,5 6,6").unwrap();
        assert_eq!(polygons.len(), 1);

        // Nested bracket
        let polygons = parse_polygons("[1,1 2,2 3,3] [4,4 [5,5 6,6] 7,7] [8,8 9,9 0,0]").unwrap();
        assert_eq!(polygons.len(), 1);

        // Leading garbage: nothing is scanned
        assert!(parse_polygons("junk [1,1 2,2 3,3]").unwrap().is_empty());
    }

    #[test]
    fn test_serialize_format() {
        let mut record = CameraRecord::new("192.168.1.103", "admin", "pass123", "1");
        record.polygons = vec![
            poly(&[(100, 100), (200, 100), (200, 200), (100, 200)]),
            poly(&[(0, 0), (5, 0), (5, 5)]),
        ];
        assert_eq!(
            serialize_record(&record),
            "192.168.1.103 admin pass123 1 1920*1080 [100,100 200,100 200,200 100,200] [0,0 5,0 5,5]"
        );

        let bare = CameraRecord::new("10.0.0.1", "a", "b", "4");
        assert_eq!(serialize_record(&bare), "10.0.0.1 a b 4 1920*1080");
    }

    #[test]
    fn test_codec_round_trip() {
        let mut record = CameraRecord::new("172.16.0.9", "operator", "p@ss:w0rd", "12");
        record.resolution = Resolution::new(704, 576);
        record.polygons = vec![
            poly(&[(0, 0), (704, 0), (704, 576), (0, 576)]),
            poly(&[(10, 20), (30, 25), (17, 60), (-3, 44), (12, 12)]),
        ];

        let line = serialize_record(&record);
        assert_eq!(parse_line(&line).unwrap(), Some(record));
    }
}
