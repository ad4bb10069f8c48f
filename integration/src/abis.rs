//! Solidity ABI definitions of the contracts exercised by the tests.
//!
//! These cover the full upgraded surface, the scripts' own bindings only
//! cover what the scripts call. Calls that predate the upgrade keep their
//! selectors, so the same bindings drive the initial implementations.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ITestTokenV2 {
        event NameUpdated(string oldName, string newName);
        event SymbolUpdated(string oldSymbol, string newSymbol);

        function initialize(string name, string symbol, address recipient, address initialOwner) external;
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function owner() external view returns (address);
        function version() external view returns (string);

        function mint(address to, uint256 amount) external;
        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function transferOwnership(address newOwner) external;
        function initializeV2() external;
        function updateName(string newName) external;
        function updateSymbol(string newSymbol) external;
        function updateTokenInfo(string newName, string newSymbol) external;
    }

    #[sol(rpc)]
    interface ITestNftV2 {
        event NameUpdated(string oldName, string newName);
        event SymbolUpdated(string oldSymbol, string newSymbol);
        event BaseURIUpdated(string oldBaseURI, string newBaseURI);
        event TokenURIUpdated(uint256 indexed tokenId, string newTokenURI);

        function initialize(string name, string symbol, string baseURI, address initialOwner) external;
        function name() external view returns (string);
        function symbol() external view returns (string);
        function owner() external view returns (address);
        function ownerOf(uint256 tokenId) external view returns (address);
        function getApproved(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string);
        function totalMinted() external view returns (uint256);
        function baseURI() external view returns (string);
        function version() external view returns (string);

        function safeMint(address to) external returns (uint256);
        function safeMintWithURI(address to, string uri) external returns (uint256);
        function batchMint(address to, uint256 amount) external returns (uint256);
        function approve(address to, uint256 tokenId) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
        function transferOwnership(address newOwner) external;
        function initializeV2() external;
        function updateCollectionInfo(string newName, string newSymbol) external;
        function setBaseURI(string newBaseURI) external;
        function setTokenURI(uint256 tokenId, string uri) external;
        function batchSetTokenURI(uint256[] tokenIds, string[] uris) external;
    }
}
