//! Fixtures shared by unit tests across modules.

use std::io::Write;

use tempfile::NamedTempFile;

/// Small scenario table: 3 regions x 2 CO2 settings x 3 time slices x 2
/// adaptation levels, plus two `Equilibrium` rows that must never be fit.
pub const SAMPLE_CSV: &str = r#"BLS Region,CO2 effects,Time_Slice,Adapt- ation,Wheat,Rice,Coarse grains,Protein feed
USA,With CO2,2020,None,4.00,3.50,-2.00,2.00
USA,With CO2,2020,Level 1,6.50,6.00,0.50,7.00
USA,With CO2,2050,None,1.00,0.50,-3.50,-2.50
USA,With CO2,2050,Level 1,3.50,3.00,-1.00,2.50
USA,With CO2,2080,None,-3.00,-3.50,-5.50,-8.50
USA,With CO2,2080,Level 1,-0.50,-1.00,-3.00,-3.50
Atlantis,With CO2,Equilibrium,None,99.00,99.00,99.00,99.00
USA,Without CO2,2020,None,-3.00,0.00,5.00,-5.00
USA,Without CO2,2020,Level 1,-0.50,2.50,7.50,0.00
USA,Without CO2,2050,None,-6.00,-3.00,3.50,-9.50
USA,Without CO2,2050,Level 1,-3.50,-0.50,6.00,-4.50
USA,Without CO2,2080,None,-10.00,-7.00,1.50,-15.50
USA,Without CO2,2080,Level 1,-7.50,-4.50,4.00,-10.50
China,With CO2,2020,None,1.00,-2.50,-5.00,5.00
China,With CO2,2020,Level 1,3.50,0.00,-2.50,10.00
China,With CO2,2050,None,-2.00,-5.50,-6.50,0.50
China,With CO2,2050,Level 1,0.50,-3.00,-4.00,5.50
China,With CO2,2080,None,-6.00,-9.50,-8.50,-5.50
China,With CO2,2080,Level 1,-3.50,-7.00,-6.00,-0.50
USA,Without CO2,Equilibrium,Level 1,-50.00,-50.00,-50.00,-50.00
China,Without CO2,2020,None,-6.00,-6.00,2.00,-2.00
China,Without CO2,2020,Level 1,-3.50,-3.50,4.50,3.00
China,Without CO2,2050,None,-9.00,-9.00,0.50,-6.50
China,Without CO2,2050,Level 1,-6.50,-6.50,3.00,-1.50
China,Without CO2,2080,None,-13.00,-13.00,-1.50,-12.50
China,Without CO2,2080,Level 1,-10.50,-10.50,1.00,-7.50
EU,With CO2,2020,None,3.50,2.50,-2.50,2.50
EU,With CO2,2020,Level 1,6.00,5.00,0.00,7.50
EU,With CO2,2050,None,0.50,-0.50,-4.00,-2.00
EU,With CO2,2050,Level 1,3.00,2.00,-1.50,3.00
EU,With CO2,2080,None,-3.50,-4.50,-6.00,-8.00
EU,With CO2,2080,Level 1,-1.00,-2.00,-3.50,-3.00
EU,Without CO2,2020,None,-3.50,-1.00,4.50,-4.50
EU,Without CO2,2020,Level 1,-1.00,1.50,7.00,0.50
EU,Without CO2,2050,None,-6.50,-4.00,3.00,-9.00
EU,Without CO2,2050,Level 1,-4.00,-1.50,5.50,-4.00
EU,Without CO2,2080,None,-10.50,-8.00,1.00,-15.00
EU,Without CO2,2080,Level 1,-8.00,-5.50,3.50,-10.00
"#;

/// Write `contents` to a temporary CSV file that lives as long as the handle.
pub fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp csv");
    file.write_all(contents.as_bytes()).expect("write temp csv");
    file.flush().expect("flush temp csv");
    file
}
