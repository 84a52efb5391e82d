#![no_main]

use convstat::table::{RawTable, MEMORY_SOURCE};
use convstat::{decode_by_parameter, decode_by_period, BlockLayout, Layout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing, and decoding whatever parses, should never panic
        if let Ok(table) = RawTable::parse(MEMORY_SOURCE, input) {
            for blocks in [BlockLayout::Pde, BlockLayout::Ode] {
                for (p, t) in [(1, 1), (2, 2), (5, 3)] {
                    if let Ok(layout) = Layout::new(p, t, blocks) {
                        let _ = decode_by_period(&table, &layout, t - 1);
                        let _ = decode_by_parameter(&table, &layout, p - 1);
                    }
                }
            }
        }
    }
});
