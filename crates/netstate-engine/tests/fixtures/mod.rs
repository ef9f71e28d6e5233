//! Test fixtures for diff engine integration tests
//!
//! Two captures of the same switch taken before and after a maintenance
//! window, plus helpers that turn them into snapshots.

#![allow(dead_code)]

use netstate_capture::{RegexTableParser, Segmenter, SnapshotBuilder};
use netstate_core::{Config, Snapshot};

pub const BEFORE: &str = "\
------------- show version -------------
Arista DCS-7050QX-32-F
Software image version: 4.18.1F
------------- show ip route -------------
 C        10.1.1.0/30 is directly connected, Ethernet1
 O        10.0.0.0/24 [110/20] via 10.1.1.1, Ethernet1
 O        10.0.1.0/24 [110/20] via 10.1.1.1, Ethernet1
 S        172.16.0.0/16 [1/0] via 10.1.1.2, Ethernet2
------------- show ip arp -------------
10.1.1.1          0:01:12  2899.3a8f.0001  Ethernet1
10.1.1.2          0:00:40  2899.3a8f.0002  Ethernet2
";

pub const AFTER: &str = "\
------------- show version -------------
Arista DCS-7050QX-32-F
Software image version: 4.20.5F
------------- show ip route -------------
 C        10.1.1.0/30 is directly connected, Ethernet1
 O        10.0.0.0/24 [110/20] via 10.1.1.5, Ethernet3
 S        172.16.0.0/16 [1/0] via 10.1.1.2, Ethernet2
 O        192.168.0.0/24 [110/30] via 10.1.1.1, Ethernet1
------------- show ip arp -------------
10.1.1.1          0:00:03  2899.3a8f.0001  Ethernet1
10.1.1.2          0:03:10  2899.3a8f.0002  Ethernet2
";

pub const ROUTE_PATTERN: &str =
    r"^\s*(?P<PROTOCOL>\S+)\s+(?P<NETWORK>[\d.]+)/(?P<MASK>\d+)\s+(?:\[[\d/]+\]\s+via\s+(?P<NEXT_HOP>[\d.]+),|is directly connected,)\s+(?P<INTERFACE>\S+)";

pub const ARP_PATTERN: &str =
    r"^(?P<ADDRESS>\d+\.\d+\.\d+\.\d+)\s+(?P<AGE>\S+)\s+(?P<MAC>[0-9a-f.]+)\s+(?P<INTERFACE>\S+)";

/// Route and ARP templates; route and ARP handlers
pub fn config() -> Config {
    let toml = format!(
        r#"
vendor = "Arista"

[diff.commands."show ip route"]
index = ["NETWORK", "MASK"]
check = ["NEXT_HOP", "INTERFACE"]

[diff.commands."show ip arp"]
index = ["ADDRESS"]
check = ["MAC", "INTERFACE"]

[parsers."show ip route"]
pattern = '{}'

[parsers."show ip arp"]
pattern = '{}'
"#,
        ROUTE_PATTERN, ARP_PATTERN
    );

    Config::from_toml(&toml).expect("fixture config is valid")
}

/// Segment and parse a transcript with the fixture config
pub fn snapshot(source_id: &str, transcript: &str) -> Snapshot {
    let config = config();
    let sections = Segmenter::from_config(&config.segment)
        .expect("default boundary compiles")
        .segment_text(transcript)
        .expect("fixture transcript has boundaries");
    let parser = RegexTableParser::from_config(&config).expect("fixture templates compile");

    SnapshotBuilder::new(&parser, &config.vendor).build(source_id, &sections)
}

pub fn before() -> Snapshot {
    snapshot("before", BEFORE)
}

pub fn after() -> Snapshot {
    snapshot("after", AFTER)
}
