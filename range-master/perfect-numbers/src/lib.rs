// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod perfect_numbers;
pub use perfect_numbers::{is_perfect, PerfectNumbers};

mod local_worker;
pub use local_worker::LocalWorker;
