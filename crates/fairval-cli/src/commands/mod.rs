pub mod comps;
pub mod dcf;
pub mod ddm;
pub mod rates;
