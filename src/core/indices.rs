use hashbrown::HashMap;

use crate::types::RequestId;

pub type VecIndex<K> = HashMap<K, Vec<RequestId>>;
