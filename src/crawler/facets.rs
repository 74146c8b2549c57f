// file: src/crawler/facets.rs
// description: listing facets of the novel listing api
// reference: mm.munpia.com list endpoints

/// One category/sort view of the listing api, paged with `page` and `rows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFacet {
    pub name: &'static str,
    pub path: &'static str,
    pub query: &'static [(&'static str, &'static str)],
}

const PAID_LIST: &str = "/pl/getList";
const FREE_LIST: &str = "/free/getList";

pub const LISTING_FACETS: [ListingFacet; 7] = [
    ListingFacet {
        name: "paid_new_best",
        path: PAID_LIST,
        query: &[("tab", "new"), ("subtab", ""), ("selectbox", ""), ("selectbox2", "")],
    },
    ListingFacet {
        name: "paid_latest",
        path: PAID_LIST,
        query: &[("tab", "serial"), ("subtab", ""), ("selectbox", ""), ("selectbox2", "new")],
    },
    ListingFacet {
        name: "paid_completed",
        path: PAID_LIST,
        query: &[("tab", "serial_end"), ("subtab", ""), ("selectbox", ""), ("selectbox2", "fin")],
    },
    ListingFacet {
        name: "free_pro",
        path: FREE_LIST,
        query: &[
            ("tab", "pro"),
            ("subtab", ""),
            ("selectbox", ""),
            ("selectbox2", "new"),
            ("selectbox3", "all"),
        ],
    },
    ListingFacet {
        name: "free_regular",
        path: FREE_LIST,
        query: &[
            ("tab", "regular"),
            ("subtab", ""),
            ("selectbox", ""),
            ("selectbox2", "new"),
            ("selectbox3", "all"),
        ],
    },
    ListingFacet {
        name: "free_board",
        path: FREE_LIST,
        query: &[
            ("tab", "free"),
            ("subtab", ""),
            ("selectbox", ""),
            ("selectbox2", "new"),
            ("selectbox3", "all"),
        ],
    },
    ListingFacet {
        name: "free_completed",
        path: FREE_LIST,
        query: &[
            ("tab", "finish"),
            ("subtab", ""),
            ("selectbox", ""),
            ("selectbox2", "new"),
            ("selectbox3", "all"),
        ],
    },
];
