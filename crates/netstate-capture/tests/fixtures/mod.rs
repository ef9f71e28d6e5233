//! Test fixtures for capture integration tests
//!
//! A trimmed show-tech style transcript from an Arista switch and a matching
//! configuration with parser templates for the tabular commands.

#![allow(dead_code)]

use netstate_core::Config;

/// Transcript with a login banner before the first section
pub const SHOW_TECH: &str = "\
Last login: Thu Sep 28 00:49:12 2017 from 10.255.0.9
carcore3#show tech-support
------------- show version detail -------------
Arista DCS-7050QX-32-F
Hardware version:    01.12
Software image version: 4.18.1F

------------- show clock -------------
Thu Sep 28 00:50:37 2017
Timezone: UTC
------------- show ip route -------------
Codes: C - connected, S - static, K - kernel,
       O - OSPF, B - BGP

Gateway of last resort is not set

 C        10.1.1.0/30 is directly connected, Ethernet1
 O        10.0.0.0/24 [110/20] via 10.1.1.1, Ethernet1
 S        172.16.0.0/16 [1/0] via 10.1.1.2, Ethernet2

------------- show ip arp -------------
Address         Age (sec)  Hardware Addr   Interface
10.1.1.1          0:01:12  2899.3a8f.0001  Ethernet1
10.1.1.2          0:00:40  2899.3a8f.0002  Ethernet2
------------- show ip interface brief -------------
Interface         IP Address        Status   Protocol
Et1               10.1.1.2/30       up       up
Et2               10.1.2.2/30       up       up
Ma1               10.255.0.3/24     up       up
";

pub const ROUTE_PATTERN: &str =
    r"^\s*(?P<PROTOCOL>\S+)\s+(?P<NETWORK>[\d.]+)/(?P<MASK>\d+)\s+(?:\[[\d/]+\]\s+via\s+(?P<NEXT_HOP>[\d.]+),|is directly connected,)\s+(?P<INTERFACE>\S+)";

pub const ARP_PATTERN: &str =
    r"^(?P<ADDRESS>\d+\.\d+\.\d+\.\d+)\s+(?P<AGE>\S+)\s+(?P<MAC>[0-9a-f.]+)\s+(?P<INTERFACE>\S+)";

pub const BRIEF_PATTERN: &str =
    r"^(?P<INTERFACE>[A-Z][a-z]+\d\S*)\s+(?P<ADDRESS>\S+)\s+(?P<STATUS>\S+)\s+(?P<PROTOCOL>\S+)";

/// Configuration with templates for route, ARP and interface tables
pub fn config() -> Config {
    let toml = format!(
        r#"
vendor = "Arista"

[segment]
vendor_signatures = ["Arista DCS-"]

[parsers."show ip route"]
pattern = '{}'

[parsers."show ip arp"]
pattern = '{}'

[parsers."show ip interface brief"]
pattern = '{}'
"#,
        ROUTE_PATTERN, ARP_PATTERN, BRIEF_PATTERN
    );

    Config::from_toml(&toml).expect("fixture config is valid")
}
