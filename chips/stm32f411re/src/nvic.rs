// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

// Extracted from RM0383 Reference manual, Table 37

pub const USART2: u32 = 38;
pub const OTG_FS_WKUP: u32 = 42;
pub const OTG_FS: u32 = 67;
