// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod enrichment_test;
mod price_parser_test;
mod scrapers_test;
mod settings_test;
