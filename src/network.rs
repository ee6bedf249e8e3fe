//! Local IPv4 address discovery for default subject alternative names

use std::net::Ipv4Addr;

/// Source of the addresses used when no alt names are given
pub trait AddressSource: Send + Sync {
    fn ipv4_addresses(&self) -> Vec<String>;
}

/// Addresses bound to the host's network interfaces
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl AddressSource for SystemInterfaces {
    fn ipv4_addresses(&self) -> Vec<String> {
        ipv4_addresses()
    }
}

/// A fixed address list, in order
impl AddressSource for Vec<String> {
    fn ipv4_addresses(&self) -> Vec<String> {
        self.clone()
    }
}

/// Every IPv4 address on every local interface, in the order the OS reports
/// them. Loopback addresses are included; nothing is deduplicated.
pub fn ipv4_addresses() -> Vec<String> {
    match enumerate() {
        Ok(addrs) => addrs.iter().map(Ipv4Addr::to_string).collect(),
        Err(e) => {
            log::debug!("Failed to enumerate network interfaces: {e}");
            Vec::new()
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn enumerate() -> std::io::Result<Vec<Ipv4Addr>> {
            let addrs = nix::ifaddrs::getifaddrs().map_err(std::io::Error::from)?;

            Ok(addrs
                .filter_map(|ifaddr| {
                    let storage = ifaddr.address?;
                    let sin = storage.as_sockaddr_in()?;
                    Some(Ipv4Addr::from(sin.ip()))
                })
                .collect())
        }
    } else if #[cfg(windows)] {
        fn enumerate() -> std::io::Result<Vec<Ipv4Addr>> {
            use windows::Win32::Foundation::{ERROR_BUFFER_OVERFLOW, ERROR_SUCCESS};
            use windows::Win32::NetworkManagement::IpHelper::{
                GAA_FLAG_SKIP_ANYCAST, GAA_FLAG_SKIP_DNS_SERVER, GAA_FLAG_SKIP_MULTICAST,
                GetAdaptersAddresses, IP_ADAPTER_ADDRESSES_LH,
            };
            use windows::Win32::Networking::WinSock::{AF_INET, SOCKADDR_IN};

            let flags = GAA_FLAG_SKIP_ANYCAST | GAA_FLAG_SKIP_MULTICAST | GAA_FLAG_SKIP_DNS_SERVER;
            let mut size: u32 = 16 * 1024;

            loop {
                // u64 backing keeps the adapter structs aligned
                let mut buffer = vec![0u64; (size as usize).div_ceil(8)];
                let head = buffer.as_mut_ptr().cast::<IP_ADAPTER_ADDRESSES_LH>();

                let rc = unsafe {
                    GetAdaptersAddresses(AF_INET.0 as u32, flags, None, Some(head), &mut size)
                };
                if rc == ERROR_BUFFER_OVERFLOW.0 {
                    continue;
                }
                if rc != ERROR_SUCCESS.0 {
                    return Err(std::io::Error::from_raw_os_error(rc as i32));
                }

                let mut found = Vec::new();
                let mut adapter = head.cast_const();
                // SAFETY: the list and its unicast chains live inside `buffer`,
                // which outlives this walk.
                unsafe {
                    while !adapter.is_null() {
                        let mut unicast = (*adapter).FirstUnicastAddress;
                        while !unicast.is_null() {
                            let sockaddr = (*unicast).Address.lpSockaddr;
                            if !sockaddr.is_null() && (*sockaddr).sa_family == AF_INET {
                                let sin = &*sockaddr.cast::<SOCKADDR_IN>();
                                found.push(Ipv4Addr::from(sin.sin_addr.S_un.S_addr.to_ne_bytes()));
                            }
                            unicast = (*unicast).Next;
                        }
                        adapter = (*adapter).Next;
                    }
                }
                return Ok(found);
            }
        }
    } else {
        fn enumerate() -> std::io::Result<Vec<Ipv4Addr>> {
            Ok(Vec::new())
        }
    }
}
