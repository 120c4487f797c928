//! Per-device extraction: folds the scope chain into a [`DeviceRecord`].

use std::collections::BTreeMap;

use roxmltree::Node;

use crate::pdsc::scope::Scope;
use crate::record::{AlgorithmRegion, CompileInfo, DeviceRecord, MemoryRegion, ProcessorInfo};

fn children_named<'a>(node: Node<'a, 'a>, tag: &'static str) -> impl Iterator<Item = Node<'a, 'a>> {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(tag))
}

fn extract_memory(scope: &Scope) -> BTreeMap<String, MemoryRegion> {
    let mut memory = BTreeMap::new();
    for level in scope.outermost_first() {
        for mem in children_named(level, "memory") {
            let (Some(id), Some(start), Some(size)) = (
                mem.attribute("id"),
                mem.attribute("start"),
                mem.attribute("size"),
            ) else {
                continue;
            };
            memory.insert(
                id.to_string(),
                MemoryRegion {
                    start: start.to_string(),
                    size: size.to_string(),
                },
            );
        }
    }
    memory
}

fn parse_default_flag(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => !matches!(v.trim(), "0" | "false" | "False"),
    }
}

fn extract_algorithm(scope: &Scope) -> BTreeMap<String, AlgorithmRegion> {
    let mut algorithm = BTreeMap::new();
    for level in scope.outermost_first() {
        for algo in children_named(level, "algorithm") {
            let (Some(name), Some(start), Some(size)) = (
                algo.attribute("name"),
                algo.attribute("start"),
                algo.attribute("size"),
            ) else {
                continue;
            };
            let name = name.replace('\\', "/");
            algorithm.insert(
                name,
                AlgorithmRegion {
                    start: start.to_string(),
                    size: size.to_string(),
                    ram_start: algo.attribute("RAMstart").map(str::to_string),
                    ram_size: algo.attribute("RAMsize").map(str::to_string),
                    default: parse_default_flag(algo.attribute("default")),
                },
            );
        }
    }
    algorithm
}

fn extract_processor(scope: &Scope) -> ProcessorInfo {
    let mut processor = ProcessorInfo::default();
    for level in scope.outermost_first() {
        for proc in children_named(level, "processor") {
            if let Some(fpu) = proc.attribute("Dfpu") {
                processor.fpu = Some(fpu.to_string());
            }
            if let Some(endian) = proc.attribute("Dendian") {
                processor.endianness = Some(endian.to_string());
            }
            if let Some(clock) = proc.attribute("Dclock") {
                processor.clock = Some(clock.to_string());
            }
        }
    }
    processor
}

fn extract_compile(scope: &Scope) -> CompileInfo {
    let mut compile = CompileInfo::default();
    for level in scope.outermost_first() {
        for c in children_named(level, "compile") {
            if let Some(header) = c.attribute("header") {
                compile.header = Some(header.to_string());
            }
            if let Some(define) = c.attribute("define") {
                compile.define = Some(define.to_string());
            }
        }
    }
    compile
}

/// Device → parent → grandparent, first hit wins.
fn pick_debug(scope: &Scope) -> Option<String> {
    scope.innermost_first().into_iter().find_map(|level| {
        children_named(level, "debug")
            .next()
            .and_then(|d| d.attribute("svd"))
            .map(str::to_string)
    })
}

/// Device → parent → grandparent, first hit wins.
fn pick_core(scope: &Scope) -> Option<String> {
    scope.innermost_first().into_iter().find_map(|level| {
        children_named(level, "processor")
            .find_map(|p| p.attribute("Dcore"))
            .map(str::to_string)
    })
}

/// Device → parent → grandparent, first hit wins. `Dvendor` sits directly on
/// the `<family>`/`<subfamily>` element, not on a child.
fn pick_vendor(scope: &Scope) -> Option<String> {
    scope
        .innermost_first()
        .into_iter()
        .find_map(|level| level.attribute("Dvendor"))
        .map(str::to_string)
}

/// The `Dname` attribute on the `<device>` element itself, if present.
pub fn device_name(device: Node) -> Option<String> {
    device.attribute("Dname").map(str::to_string)
}

/// Flattens one `<device>` element's scope chain into a [`DeviceRecord`].
///
/// Returns `None` only when the device carries no `Dname`; every other
/// missing section or attribute is silently omitted per the error policy.
pub fn extract_device(device: Node, pdsc_file: &str, pack_file: &str) -> Option<DeviceRecord> {
    device_name(device)?;

    let scope = Scope::for_device(device);
    let processor = extract_processor(&scope);
    let compile = extract_compile(&scope);

    Some(DeviceRecord {
        pdsc_file: pdsc_file.to_string(),
        pack_file: pack_file.to_string(),
        memory: extract_memory(&scope),
        algorithm: extract_algorithm(&scope),
        debug: pick_debug(&scope),
        compile: (!compile.is_empty()).then_some(compile),
        core: pick_core(&scope),
        processor: (!processor.is_empty()).then_some(processor),
        vendor: pick_vendor(&scope),
    })
}

/// Extracts `(board name, mounted device names)` pairs from every `<board>`
/// element in the document.
pub fn extract_board_aliases(boards: &[Node]) -> Vec<(String, Vec<String>)> {
    boards
        .iter()
        .filter_map(|board| {
            let name = board.attribute("name")?.to_string();
            let devices: Vec<String> = children_named(*board, "mounteddevice")
                .filter_map(|m| m.attribute("Dname").map(str::to_string))
                .collect();
            (!devices.is_empty()).then_some((name, devices))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdsc::document::PdscDocument;

    fn devices_in(xml: &str) -> Vec<DeviceRecord> {
        let doc = PdscDocument::parse(xml, "http://example.com/a.pdsc").unwrap();
        doc.devices()
            .into_iter()
            .filter_map(|d| extract_device(d, "http://example.com/a.pdsc", "http://example.com/a.pack"))
            .collect()
    }

    #[test]
    fn device_merges_family_level_fields_with_device_overriding() {
        let xml = r#"
<package>
  <devices>
    <family Dvendor="Acme" Dfamily="MyFamily">
      <processor Dcore="Cortex-M4" Dfpu="1" Dendian="Little"/>
      <memory id="IROM1" start="0x00000000" size="0x80000"/>
      <device Dname="MyDevice">
        <memory id="IRAM1" start="0x10000000" size="0x8000"/>
      </device>
    </family>
  </devices>
</package>"#;
        let devices = devices_in(xml);
        assert_eq!(devices.len(), 1);
        let d = &devices[0];
        assert_eq!(d.core.as_deref(), Some("Cortex-M4"));
        assert_eq!(d.vendor.as_deref(), Some("Acme"));
        assert_eq!(d.memory.len(), 2);
        assert!(d.memory.contains_key("IROM1"));
        assert!(d.memory.contains_key("IRAM1"));
        assert_eq!(d.processor.as_ref().unwrap().fpu.as_deref(), Some("1"));
    }

    #[test]
    fn device_level_memory_overrides_family_level_on_conflicting_id() {
        let xml = r#"
<package>
  <devices>
    <family Dvendor="Acme" Dfamily="MyFamily">
      <memory id="IROM1" start="0x00000000" size="0x80000"/>
      <device Dname="MyDevice">
        <memory id="IROM1" start="0x08000000" size="0x100000"/>
      </device>
    </family>
  </devices>
</package>"#;
        let devices = devices_in(xml);
        let region = &devices[0].memory["IROM1"];
        assert_eq!(region.start, "0x08000000");
        assert_eq!(region.size, "0x100000");
    }

    #[test]
    fn three_nesting_depths_produce_structurally_equivalent_records() {
        let direct = r#"
<package><devices><family Dvendor="Acme">
  <device Dname="D">
    <memory id="IROM1" start="0x0" size="0x100"/>
  </device>
</family></devices></package>"#;
        let via_subfamily = r#"
<package><devices><family Dvendor="Acme"><subfamily>
  <device Dname="D">
    <memory id="IROM1" start="0x0" size="0x100"/>
  </device>
</subfamily></family></devices></package>"#;
        let d1 = devices_in(direct);
        let d2 = devices_in(via_subfamily);
        assert_eq!(d1[0].memory, d2[0].memory);
        assert_eq!(d1[0].vendor, d2[0].vendor);
    }

    #[test]
    fn algorithm_name_backslashes_are_normalized_and_default_defaults_true() {
        let xml = r#"
<package><devices><family>
  <device Dname="D">
    <algorithm name="Flash\IAP.FLM" start="0x0" size="0x80000"/>
  </device>
</family></devices></package>"#;
        let devices = devices_in(xml);
        let algo = &devices[0].algorithm["Flash/IAP.FLM"];
        assert!(algo.default);
    }

    #[test]
    fn empty_processor_and_compile_sections_are_omitted() {
        let xml = r#"
<package><devices><family>
  <device Dname="D"/>
</family></devices></package>"#;
        let devices = devices_in(xml);
        assert!(devices[0].processor.is_none());
        assert!(devices[0].compile.is_none());
    }

    #[test]
    fn a_device_without_dname_is_skipped() {
        let xml = r#"
<package><devices><family>
  <device/>
</family></devices></package>"#;
        assert_eq!(devices_in(xml).len(), 0);
    }

    #[test]
    fn board_aliases_collect_mounted_device_names() {
        let xml = r#"
<package>
  <boards>
    <board name="MyBoard">
      <mounteddevice Dname="MyDevice"/>
      <mounteddevice Dname="OtherDevice"/>
    </board>
  </boards>
</package>"#;
        let doc = PdscDocument::parse(xml, "u").unwrap();
        let aliases = extract_board_aliases(&doc.boards());
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].0, "MyBoard");
        assert_eq!(aliases[0].1, vec!["MyDevice", "OtherDevice"]);
    }
}
